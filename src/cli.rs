//! CLI implementation for aurora-scan
//!
//! Subcommands: render the enriched table as HTML, look up one record's
//! detail page, dump the record set as pretty JSON, and clear the RPC
//! result cache.

use crate::cache::DiskCache;
use crate::config::{self, ExplorerConfig};
use crate::enrich::RecordEnricher;
use crate::indexer::IndexerDb;
use crate::render;
use crate::rpc::NearRpcClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Aurora bridge explorer
#[derive(Parser)]
#[command(name = "aurora-scan")]
#[command(about = "Read-only explorer for the Aurora bridge contract on NEAR")]
pub struct Cli {
    /// NEAR JSON-RPC endpoint URL
    #[arg(long, default_value = config::DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Indexer Postgres connection URL
    #[arg(long, default_value = config::DEFAULT_DATABASE_URL)]
    database_url: String,

    /// Receiver account to explore
    #[arg(long, default_value = config::DEFAULT_RECEIVER_ACCOUNT)]
    receiver: String,

    /// Directory for cached RPC results
    #[arg(long, default_value = config::DEFAULT_CACHE_DIR)]
    cache_dir: PathBuf,

    /// Concurrent enrichment workers
    #[arg(long, default_value_t = config::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, enrich, and render the record table as HTML
    Table {
        /// Write the HTML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render the detail page for one record
    Detail {
        /// Action receipt id
        receipt_id: String,
        /// Originating transaction hash
        tx_id: String,
        /// Write the HTML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch, enrich, and print the record set as pretty JSON
    Dump,
    /// Delete every cached RPC result
    ClearCache,
}

impl Cli {
    fn config(&self) -> ExplorerConfig {
        ExplorerConfig {
            rpc_url: self.rpc_url.clone(),
            database_url: self.database_url.clone(),
            receiver_account: self.receiver.clone(),
            cache_dir: self.cache_dir.clone(),
            concurrency: self.concurrency,
        }
    }
}

/// Parse arguments and run the selected command.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    match cli.command {
        Commands::Table { output } => {
            let enricher = enricher(&config)?;
            let records = fetch_records(&config, &enricher).await?;
            let now = time::OffsetDateTime::now_utc();
            write_output(output.as_deref(), &render::render_table(&records, now))
        }
        Commands::Detail {
            receipt_id,
            tx_id,
            output,
        } => {
            let enricher = enricher(&config)?;
            let detail = enricher
                .record_detail(&receipt_id, &tx_id)
                .await
                .with_context(|| format!("failed to look up record {receipt_id}/{tx_id}"))?;
            write_output(output.as_deref(), &render::render_detail(&detail))
        }
        Commands::Dump => {
            let enricher = enricher(&config)?;
            let records = fetch_records(&config, &enricher).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
        Commands::ClearCache => {
            let cache = DiskCache::open(&config.cache_dir)
                .with_context(|| format!("failed to open cache at {:?}", config.cache_dir))?;
            let removed = cache.clear().context("failed to clear cache")?;
            println!("{}", serde_json::json!({ "status": "ok", "removed": removed }));
            Ok(())
        }
    }
}

fn enricher(config: &ExplorerConfig) -> Result<RecordEnricher<NearRpcClient>> {
    let client = NearRpcClient::new(config.rpc_url.clone());
    let cache = DiskCache::open(&config.cache_dir)
        .with_context(|| format!("failed to open cache at {:?}", config.cache_dir))?;
    Ok(RecordEnricher::new(client, cache, config.concurrency))
}

async fn fetch_records(
    config: &ExplorerConfig,
    enricher: &RecordEnricher<NearRpcClient>,
) -> Result<Vec<crate::records::Record>> {
    let db = IndexerDb::connect(&config.database_url)
        .await
        .context("failed to connect to indexer database")?;
    let rows = db
        .fetch_actions(&config.receiver_account)
        .await
        .with_context(|| format!("failed to fetch actions for {}", config.receiver_account))?;
    enricher
        .build_records(rows)
        .await
        .context("failed to enrich records")
}

fn write_output(output: Option<&std::path::Path>, html: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, html)
            .with_context(|| format!("failed to write output to {path:?}")),
        None => {
            println!("{html}");
            Ok(())
        }
    }
}
