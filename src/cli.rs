use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::load_config::load_config;
use crate::reconcile;
use crate::supabase::SupabaseClient;

/// CLI for mission-catalog-sync: reconcile the mission bucket into the
/// catalog table.
#[derive(Parser)]
#[clap(
    name = "mission-catalog-sync",
    version,
    about = "Reconcile JSON mission definitions in storage against the missions catalog table"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one reconciliation pass using the given config file
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            let client = SupabaseClient::new_from_env()
                .map_err(|e| anyhow::anyhow!("Failed to construct Supabase client: {e}"))?;

            println!("Reconciliation starting...");
            let response = reconcile::run(&config, &client, &client).await;
            println!("{}", serde_json::to_string_pretty(&response)?);

            if response.success {
                Ok(())
            } else {
                Err(anyhow::anyhow!(response.message))
            }
        }
    }
}
