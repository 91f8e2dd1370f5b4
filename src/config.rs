use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Where the engine reads mission definitions from and which table it
/// reconciles them into. All fields have defaults so an empty config file is
/// valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Storage bucket holding the mission definition JSON files.
    pub bucket: String,
    /// Catalog table the mission records live in.
    pub table: String,
    /// Bucket recorded as `assets_bucket` on synced records that lack one.
    pub assets_bucket: String,
    /// Prefix discovery starts from; empty means the bucket root.
    pub root_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            bucket: "missions".to_string(),
            table: "missions".to_string(),
            assets_bucket: "mission-assets".to_string(),
            root_prefix: String::new(),
        }
    }
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            bucket = %self.bucket,
            table = %self.table,
            assets_bucket = %self.assets_bucket,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}
