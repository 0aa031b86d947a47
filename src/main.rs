//! aurora-scan - Aurora bridge explorer CLI
//!
//! Reads indexed bridge actions, enriches them against a NEAR archival
//! RPC node, and renders them as HTML or JSON.

use aurora_scan::cli;
use tracing::Level;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    if let Err(e) = cli::run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
