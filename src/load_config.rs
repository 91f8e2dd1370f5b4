use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::{error, info};

use crate::config::SyncConfig;

/// Loads the static YAML config file. No secrets live here: Supabase
/// credentials come from the environment (see
/// [`crate::supabase::SupabaseClient::new_from_env`]). An empty file yields
/// the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: SyncConfig = if content.trim().is_empty() {
        SyncConfig::default()
    } else {
        match serde_yaml::from_str(&content) {
            Ok(config) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                config
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    config.trace_loaded();
    Ok(config)
}
