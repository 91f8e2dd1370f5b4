//! The mission catalog reconciliation engine.
//!
//! One run discovers every `.json` mission definition in the storage bucket,
//! loads the catalog table once, and then folds over the discovered paths
//! strictly one at a time: each file is matched against the catalog (by
//! object path, then mission uid, then order number), producing either a
//! keyed update or a fresh insert, and the working state is advanced before
//! the next file so uid and order-number uniqueness holds across the whole
//! run.
//!
//! # Error tiers
//! - Fatal (whole run): bucket enumeration fails, the bucket is missing, the
//!   listing fails, or the catalog cannot be read. Returned as
//!   `success = false` with a zero summary — no partial work is attempted.
//! - Per-file (isolated): download, parse, insert or update failures skip
//!   that file with a `(path, reason)` entry and the run continues. One
//!   malformed file never blocks the rest of the catalog from updating.
//!
//! # Concurrency
//! Files are processed sequentially, never in parallel: allocation of order
//! numbers and uids reads and mutates shared run state. The run is idempotent
//! and safe to resume; it provides no locking against a concurrent second
//! run.
//!
//! # Navigation
//! - Main entrypoint: [`run`]
//! - Supporting types: [`ReconcileResponse`], [`RunSummary`], [`ReconcileState`]

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::contract::{
    BackendError, CatalogKey, CatalogPatch, CatalogRecord, CatalogStore, StorageProvider,
};
use crate::discover;
use crate::payload::{assets_prefix, MissionPayload};

/// Aggregate counters for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub files_scanned: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<SkipEntry>,
}

/// One skipped file and why it was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipEntry {
    pub path: String,
    pub reason: String,
}

/// Structured trigger response. Fatal failures arrive as `success = false`
/// with a zero summary and a descriptive message, never as a bare error.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    pub summary: RunSummary,
}

/// Why a single file was skipped. Skips are isolated: the run continues with
/// the next file.
#[derive(Debug)]
pub enum SkipReason {
    Download(BackendError),
    InvalidJson(serde_json::Error),
    /// The matched record has none of the three identifying columns, so no
    /// update can address it.
    MissingKey,
    Update(BackendError),
    Insert(BackendError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Download(e) => write!(f, "Download failed: {e}"),
            SkipReason::InvalidJson(e) => write!(f, "Invalid JSON format: {e}"),
            SkipReason::MissingKey => {
                write!(f, "Record has no mission_uid, order_no or object_path to update by")
            }
            SkipReason::Update(e) => write!(f, "Update failed: {e}"),
            SkipReason::Insert(e) => write!(f, "Insert failed: {e}"),
        }
    }
}

enum Applied {
    Inserted,
    Updated,
}

/// Working state for one run: the loaded catalog snapshot, match indices
/// over it, and allocation sets covering the snapshot plus everything
/// written during the run.
///
/// Match indices and allocation sets deliberately diverge. A record inserted
/// during the run must never be *matched* by a later file — each colliding
/// file becomes its own record with a freshly allocated uid and order — but
/// its uid and order number must never be *reallocated* either.
pub struct ReconcileState {
    records: Vec<CatalogRecord>,
    by_uid: HashMap<String, usize>,
    by_order: HashMap<i64, usize>,
    by_path: HashMap<String, usize>,
    used_orders: HashSet<i64>,
    used_uids: HashSet<String>,
}

impl ReconcileState {
    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        let mut by_uid = HashMap::new();
        let mut by_order = HashMap::new();
        let mut by_path = HashMap::new();
        let mut used_orders = HashSet::new();
        let mut used_uids = HashSet::new();

        for (idx, record) in records.iter().enumerate() {
            if let Some(uid) = &record.mission_uid {
                by_uid.insert(uid.clone(), idx);
                used_uids.insert(uid.clone());
            }
            if let Some(order) = record.order_no {
                by_order.insert(order, idx);
                used_orders.insert(order);
            }
            if let Some(path) = &record.object_path {
                by_path.insert(path.clone(), idx);
            }
        }

        Self {
            records,
            by_uid,
            by_order,
            by_path,
            used_orders,
            used_uids,
        }
    }

    /// Match resolution in strict priority: object path, then mission uid,
    /// then order number (only when the file carries an order candidate).
    fn find_match(&self, path: &str, payload: &MissionPayload) -> Option<usize> {
        if let Some(&idx) = self.by_path.get(path) {
            return Some(idx);
        }
        if let Some(&idx) = self.by_uid.get(&payload.slug) {
            return Some(idx);
        }
        if let Some(hint) = payload.order_hint {
            if let Some(&idx) = self.by_order.get(&(hint.trunc() as i64)) {
                return Some(idx);
            }
        }
        None
    }

    /// Starts at the candidate and bumps past used values; without a
    /// candidate, one past the highest used order (1 on an empty catalog).
    fn allocate_order(&self, hint: Option<i64>) -> i64 {
        match hint {
            Some(mut candidate) => {
                while self.used_orders.contains(&candidate) {
                    candidate += 1;
                }
                candidate
            }
            None => self.used_orders.iter().max().map_or(1, |max| max + 1),
        }
    }

    /// The slug itself when unused, else `slug-1`, `slug-2`, ...
    fn allocate_uid(&self, slug: &str) -> String {
        if !self.used_uids.contains(slug) {
            return slug.to_string();
        }
        let mut n = 1u32;
        loop {
            let candidate = format!("{slug}-{n}");
            if !self.used_uids.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Folds an applied patch back into the snapshot record and its indices
    /// so subsequent files observe it.
    fn apply_patch(&mut self, idx: usize, patch: &CatalogPatch) {
        if let Some(uid) = &patch.mission_uid {
            self.by_uid.insert(uid.clone(), idx);
            self.used_uids.insert(uid.clone());
            self.records[idx].mission_uid = Some(uid.clone());
        }
        if let Some(path) = &patch.object_path {
            if let Some(old) = self.records[idx].object_path.take() {
                self.by_path.remove(&old);
            }
            self.by_path.insert(path.clone(), idx);
            self.records[idx].object_path = Some(path.clone());
        }
        if let Some(title) = &patch.title {
            self.records[idx].title = Some(title.clone());
        }
        if let Some(bucket) = &patch.assets_bucket {
            self.records[idx].assets_bucket = Some(bucket.clone());
        }
        if let Some(prefix) = &patch.assets_prefix {
            self.records[idx].assets_prefix = Some(prefix.clone());
        }
        if patch.unlock_playground.is_some() {
            self.records[idx].unlock_playground = patch.unlock_playground;
        }
        if patch.unlocks_projects.is_some() {
            self.records[idx].unlocks_projects = patch.unlocks_projects;
        }
    }

    /// Registers an inserted record: matchable by path only (see type docs),
    /// with its uid and order reserved against reallocation.
    fn apply_insert(&mut self, record: CatalogRecord) {
        let idx = self.records.len();
        if let Some(uid) = &record.mission_uid {
            self.used_uids.insert(uid.clone());
        }
        if let Some(order) = record.order_no {
            self.used_orders.insert(order);
        }
        if let Some(path) = &record.object_path {
            self.by_path.insert(path.clone(), idx);
        }
        self.records.push(record);
    }
}

/// Runs one full reconciliation pass: the parameterless trigger exposed to
/// the rest of the application. Always returns a structured response.
pub async fn run<S, C>(config: &SyncConfig, storage: &S, catalog: &C) -> ReconcileResponse
where
    S: StorageProvider + ?Sized,
    C: CatalogStore + ?Sized,
{
    match run_inner(config, storage, catalog).await {
        Ok(summary) => {
            let message = format!(
                "Reconciliation complete: {} inserted, {} updated, {} skipped",
                summary.inserted, summary.updated, summary.skipped
            );
            info!(
                files = summary.files_scanned,
                inserted = summary.inserted,
                updated = summary.updated,
                skipped = summary.skipped,
                "[SYNC] Reconciliation complete"
            );
            ReconcileResponse {
                success: true,
                message,
                summary,
            }
        }
        Err(message) => {
            error!(reason = %message, "[SYNC][ERROR] Reconciliation aborted");
            ReconcileResponse {
                success: false,
                message,
                summary: RunSummary::default(),
            }
        }
    }
}

async fn run_inner<S, C>(
    config: &SyncConfig,
    storage: &S,
    catalog: &C,
) -> Result<RunSummary, String>
where
    S: StorageProvider + ?Sized,
    C: CatalogStore + ?Sized,
{
    info!(bucket = %config.bucket, table = %config.table, "[SYNC] Starting mission catalog reconciliation");

    let buckets = storage
        .list_buckets()
        .await
        .map_err(|e| format!("Failed to list storage buckets: {e}"))?;
    if !buckets.iter().any(|b| b == &config.bucket) {
        return Err(format!("Storage bucket '{}' does not exist", config.bucket));
    }

    let paths = discover::list_json_objects(storage, &config.bucket, &config.root_prefix)
        .await
        .map_err(|e| format!("Failed to list mission files: {e}"))?;
    info!(files = paths.len(), "[SYNC] Discovered mission definition files");

    let rows = catalog
        .select_all(&config.table)
        .await
        .map_err(|e| format!("Failed to read catalog table '{}': {e}", config.table))?;
    info!(records = rows.len(), "[SYNC] Loaded catalog snapshot");
    let mut state = ReconcileState::from_records(rows);

    let mut summary = RunSummary::default();
    // Strictly sequential: each file must observe every prior allocation.
    for path in &paths {
        summary.files_scanned += 1;
        match process_object(&mut state, storage, catalog, config, path).await {
            Ok(Applied::Inserted) => {
                summary.inserted += 1;
                info!(path = %path, "[SYNC] Inserted mission");
            }
            Ok(Applied::Updated) => {
                summary.updated += 1;
                info!(path = %path, "[SYNC] Updated mission");
            }
            Err(reason) => {
                summary.skipped += 1;
                let reason = reason.to_string();
                warn!(path = %path, reason = %reason, "[SYNC] Skipped mission file");
                summary.errors.push(SkipEntry {
                    path: path.clone(),
                    reason,
                });
            }
        }
    }

    Ok(summary)
}

/// One file through the state machine:
/// `Discovered -> Downloaded -> Parsed -> {Skipped | Updated | Inserted}`.
async fn process_object<S, C>(
    state: &mut ReconcileState,
    storage: &S,
    catalog: &C,
    config: &SyncConfig,
    path: &str,
) -> Result<Applied, SkipReason>
where
    S: StorageProvider + ?Sized,
    C: CatalogStore + ?Sized,
{
    let bytes = storage
        .download(&config.bucket, path)
        .await
        .map_err(SkipReason::Download)?;
    let payload = MissionPayload::resolve(path, &bytes).map_err(SkipReason::InvalidJson)?;
    debug!(path = %path, slug = %payload.slug, order_hint = ?payload.order_hint, "Resolved mission payload");

    match state.find_match(path, &payload) {
        Some(idx) => update_existing(state, catalog, config, path, &payload, idx).await,
        None => insert_new(state, catalog, config, path, payload).await,
    }
}

async fn update_existing<C>(
    state: &mut ReconcileState,
    catalog: &C,
    config: &SyncConfig,
    path: &str,
    payload: &MissionPayload,
    idx: usize,
) -> Result<Applied, SkipReason>
where
    C: CatalogStore + ?Sized,
{
    let existing = &state.records[idx];

    // The row must be addressable by one of its current columns.
    let key = if let Some(uid) = &existing.mission_uid {
        CatalogKey::MissionUid(uid.clone())
    } else if let Some(order) = existing.order_no {
        CatalogKey::OrderNo(order)
    } else if let Some(current_path) = &existing.object_path {
        CatalogKey::ObjectPath(current_path.clone())
    } else {
        return Err(SkipReason::MissingKey);
    };

    // mission_uid is fill-if-absent only; an existing uid is never rewritten.
    let effective_uid = match &existing.mission_uid {
        Some(uid) => uid.clone(),
        None => state.allocate_uid(&payload.slug),
    };

    let mut patch = CatalogPatch {
        unlock_playground: Some(true),
        unlocks_projects: Some(true),
        ..CatalogPatch::default()
    };
    if existing.mission_uid.is_none() {
        patch.mission_uid = Some(effective_uid.clone());
    }
    if existing.object_path.as_deref() != Some(path) {
        patch.object_path = Some(path.to_string());
    }
    if existing.assets_bucket.is_none() {
        patch.assets_bucket = Some(config.assets_bucket.clone());
    }
    let prefix = assets_prefix(&effective_uid);
    if existing.assets_prefix.as_deref() != Some(prefix.as_str()) {
        patch.assets_prefix = Some(prefix);
    }
    if existing.title.as_deref() != Some(payload.title.as_str()) {
        patch.title = Some(payload.title.clone());
    }

    catalog
        .update(&config.table, key, patch.clone())
        .await
        .map_err(SkipReason::Update)?;
    state.apply_patch(idx, &patch);
    Ok(Applied::Updated)
}

async fn insert_new<C>(
    state: &mut ReconcileState,
    catalog: &C,
    config: &SyncConfig,
    path: &str,
    payload: MissionPayload,
) -> Result<Applied, SkipReason>
where
    C: CatalogStore + ?Sized,
{
    let order_no = state.allocate_order(payload.order_hint.map(|n| n.trunc() as i64));
    let mission_uid = state.allocate_uid(&payload.slug);

    let record = CatalogRecord {
        mission_uid: Some(mission_uid.clone()),
        order_no: Some(order_no),
        object_path: Some(path.to_string()),
        title: Some(payload.title.clone()),
        assets_bucket: Some(config.assets_bucket.clone()),
        assets_prefix: Some(assets_prefix(&mission_uid)),
        unlock_playground: Some(true),
        unlocks_projects: Some(true),
        mission_data: Some(payload.raw),
    };

    match catalog.insert(&config.table, record.clone()).await {
        Ok(_) => {}
        Err(first) => {
            // The embedded payload is the usual culprit (e.g. the catalog
            // schema has no mission_data column); retry once without it.
            warn!(path = %path, error = %first, "Full insert failed, retrying without mission_data");
            let minimal = CatalogRecord {
                mission_data: None,
                ..record.clone()
            };
            catalog
                .insert(&config.table, minimal)
                .await
                .map_err(SkipReason::Insert)?;
        }
    }
    state.apply_insert(record);
    Ok(Applied::Inserted)
}
