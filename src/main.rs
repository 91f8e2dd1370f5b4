use anyhow::Result;
use clap::Parser;

use mission_catalog_sync::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("[ERROR] Reconciliation failed: {e}");
            std::process::exit(1);
        }
    }
}
