//! Supabase-backed implementations of the collaborator traits.
//!
//! The Storage API serves bucket enumeration, folder listing and object
//! download; PostgREST serves the catalog table. One client implements both
//! [`StorageProvider`] and [`CatalogStore`], so the CLI can hand the same
//! value to the engine twice.
//!
//! Upstream errors are flattened into the boxed [`BackendError`]; the engine
//! decides which tier (fatal or per-file) they belong to.

use async_trait::async_trait;
use serde::Deserialize;

use crate::contract::{
    BackendError, CatalogKey, CatalogPatch, CatalogRecord, CatalogStore, StorageEntry,
    StorageProvider,
};

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }

    /// Builds a client from `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`,
    /// loading `.env` first if present.
    pub fn new_from_env() -> Result<Self, BackendError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("SUPABASE_URL")?;
        let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")?;
        Ok(Self::new(base_url, service_key))
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

// Wire shapes of the Storage API; folders come back with null id, timestamps
// and metadata.
#[derive(Deserialize)]
struct BucketRow {
    name: String,
}

#[derive(Deserialize)]
struct ObjectRow {
    name: String,
    id: Option<String>,
    updated_at: Option<String>,
    metadata: Option<ObjectMetadata>,
}

#[derive(Deserialize)]
struct ObjectMetadata {
    size: Option<u64>,
}

#[async_trait]
impl StorageProvider for SupabaseClient {
    async fn list_buckets(&self) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/storage/v1/bucket", self.base_url);
        let resp = self.auth(self.http.get(&url)).send().await?;
        if !resp.status().is_success() {
            return Err(format!("Bucket listing failed with status {}", resp.status()).into());
        }
        let rows: Vec<BucketRow> = resp.json().await?;
        Ok(rows.into_iter().map(|bucket| bucket.name).collect())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<StorageEntry>, BackendError> {
        let url = format!("{}/storage/v1/object/list/{bucket}", self.base_url);
        let body = serde_json::json!({
            "prefix": prefix,
            "limit": 10_000,
            "offset": 0,
        });
        let resp = self.auth(self.http.post(&url)).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(format!(
                "Listing '{bucket}/{prefix}' failed with status {}",
                resp.status()
            )
            .into());
        }
        let rows: Vec<ObjectRow> = resp.json().await?;
        Ok(rows
            .into_iter()
            .map(|row| StorageEntry {
                name: row.name,
                id: row.id,
                updated_at: row.updated_at,
                size: row.metadata.and_then(|m| m.size),
            })
            .collect())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, BackendError> {
        let url = format!("{}/storage/v1/object/{bucket}/{path}", self.base_url);
        let resp = self.auth(self.http.get(&url)).send().await?;
        if !resp.status().is_success() {
            return Err(format!(
                "Download of '{bucket}/{path}' failed with status {}",
                resp.status()
            )
            .into());
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

#[async_trait]
impl CatalogStore for SupabaseClient {
    async fn select_all(&self, table: &str) -> Result<Vec<CatalogRecord>, BackendError> {
        let url = format!("{}/rest/v1/{table}?select=*", self.base_url);
        let resp = self.auth(self.http.get(&url)).send().await?;
        if !resp.status().is_success() {
            return Err(format!(
                "Select from '{table}' failed with status {}",
                resp.status()
            )
            .into());
        }
        Ok(resp.json().await?)
    }

    async fn insert(
        &self,
        table: &str,
        record: CatalogRecord,
    ) -> Result<CatalogRecord, BackendError> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        let resp = self
            .auth(self.http.post(&url))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(format!("Insert into '{table}' failed with status {status}: {detail}").into());
        }
        let mut rows: Vec<CatalogRecord> = resp.json().await?;
        Ok(rows.pop().ok_or("Insert returned no representation")?)
    }

    async fn update(
        &self,
        table: &str,
        key: CatalogKey,
        patch: CatalogPatch,
    ) -> Result<(), BackendError> {
        let url = format!(
            "{}/rest/v1/{table}?{}=eq.{}",
            self.base_url,
            key.column(),
            key.value()
        );
        let resp = self.auth(self.http.patch(&url)).json(&patch).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(format!(
                "Update of '{table}' by {} failed with status {status}: {detail}",
                key.column()
            )
            .into());
        }
        Ok(())
    }
}
