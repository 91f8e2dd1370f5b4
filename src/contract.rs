//! # contract: collaborator interfaces for the reconciliation engine
//!
//! This module defines the two traits the engine consumes — a blob-storage
//! provider and a relational catalog store — plus the plain data types they
//! exchange. The engine itself never talks HTTP; it only sees these traits.
//!
//! ## Interface & Extensibility
//! - Implement [`StorageProvider`] for a storage backend exposing bucket
//!   enumeration, folder listing and object download.
//! - Implement [`CatalogStore`] for a relational backend exposing read,
//!   insert and keyed update against the missions table.
//! - All methods are async, returning results with boxed error types.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`, so the test suite can drive a
//!   whole reconciliation run against deterministic mocks. Mocks are exported
//!   behind the `test-export-mocks` feature (on by default) so integration
//!   tests outside the crate can use them too.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Uniform error type for collaborator calls.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// One entry of a bucket folder listing.
///
/// Folder entries carry none of the file-identifying metadata: no id, no
/// last-modified timestamp, no size. Anything else is a leaf object.
#[derive(Debug, Clone, Default)]
pub struct StorageEntry {
    pub name: String,
    pub id: Option<String>,
    pub updated_at: Option<String>,
    pub size: Option<u64>,
}

impl StorageEntry {
    /// An entry is a file when any file-identifying metadata is present.
    pub fn is_file(&self) -> bool {
        self.id.is_some() || self.updated_at.is_some() || self.size.is_some()
    }
}

/// A row of the missions catalog table.
///
/// Every column is optional on the wire: rows written before the sync engine
/// existed may lack any of them, and the minimal insert fallback omits
/// `mission_data` entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_no: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_playground: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocks_projects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_data: Option<serde_json::Value>,
}

/// Partial update for one catalog row. Absent fields are left untouched by
/// the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_playground: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocks_projects: Option<bool>,
}

/// Column a catalog row is addressed by when applying a patch.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogKey {
    MissionUid(String),
    OrderNo(i64),
    ObjectPath(String),
}

impl CatalogKey {
    pub fn column(&self) -> &'static str {
        match self {
            CatalogKey::MissionUid(_) => "mission_uid",
            CatalogKey::OrderNo(_) => "order_no",
            CatalogKey::ObjectPath(_) => "object_path",
        }
    }

    pub fn value(&self) -> String {
        match self {
            CatalogKey::MissionUid(uid) => uid.clone(),
            CatalogKey::OrderNo(order) => order.to_string(),
            CatalogKey::ObjectPath(path) => path.clone(),
        }
    }
}

/// Trait for the blob-storage side: bucket enumeration, folder listing and
/// object download. Implemented by the real BaaS client and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Names of all buckets visible to the client.
    async fn list_buckets(&self) -> Result<Vec<String>, BackendError>;

    /// Entries directly under `prefix` in `bucket` (one level, not
    /// recursive). An empty prefix lists the bucket root.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<StorageEntry>, BackendError>;

    /// Raw bytes of the object at `path`.
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, BackendError>;
}

/// Trait for the relational side: the missions catalog table.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every row of `table`.
    async fn select_all(&self, table: &str) -> Result<Vec<CatalogRecord>, BackendError>;

    /// Insert one row, returning the stored representation.
    async fn insert(
        &self,
        table: &str,
        record: CatalogRecord,
    ) -> Result<CatalogRecord, BackendError>;

    /// Apply `patch` to the row addressed by `key`.
    async fn update(
        &self,
        table: &str,
        key: CatalogKey,
        patch: CatalogPatch,
    ) -> Result<(), BackendError>;
}
