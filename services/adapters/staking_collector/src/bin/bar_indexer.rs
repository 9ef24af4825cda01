//! Bar Indexer Binary
//!
//! Follows the share token's Transfer logs and keeps the bar, holder and
//! daily history records up to date.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use staking_adapter::feed::resume_block;
use staking_adapter::{TransferFeed, Web3PoolReader};
use staking_config::IndexerConfig;
use state_staking::{BarIndexer, EntityStore, MemoryStore, TracingNotifier};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use web3::transports::Http;
use web3::Web3;

#[derive(Parser)]
#[command(name = "bar_indexer")]
#[command(about = "Incremental accounting indexer for the staking bar")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "indexer.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(default_level: &str, debug: bool, json: bool) {
    let level = if debug { "debug" } else { default_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn persist(store: &MemoryStore, data_dir: Option<&Path>) {
    if let Some(dir) = data_dir {
        if let Err(e) = store.persist_to(dir) {
            error!("❌ Failed to persist snapshot to {:?}: {}", dir, e);
        }
    }
}

fn block_date(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = IndexerConfig::from_toml_with_env_overrides(&args.config)?;
    init_tracing(&config.log_level, args.debug, args.json_logs);
    config.validate()?;

    info!("🚀 Starting bar indexer for {}", config.bar_address);
    info!("📋 Configuration loaded from: {:?}", args.config);

    let data_dir = config.data_dir.clone();
    let store = match &data_dir {
        Some(dir) => MemoryStore::load_from(dir)
            .with_context(|| format!("Failed to load snapshot from {:?}", dir))?,
        None => {
            warn!("No data_dir configured; state will not survive a restart");
            MemoryStore::new()
        }
    };

    let next_block = resume_block(store.cursor()?, config.start_block);
    info!("⏩ Resuming from block {}", next_block);

    let transport = Http::new(&config.rpc_url)
        .with_context(|| format!("Invalid RPC URL: {}", config.rpc_url))?;
    let web3 = Web3::new(transport);

    let reader = Web3PoolReader::new(web3.clone(), config.bar_address, config.token_address);
    let mut indexer = BarIndexer::new(config.bar_address, store, reader, TracingNotifier);
    let mut feed = TransferFeed::new(web3, config.bar_address, config.batch_size, next_block);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = feed.sync_batch(&mut indexer) => match result {
                Ok(Some(report)) => {
                    if report.applied > 0 {
                        let stats = indexer.store().stats();
                        info!(
                            "✅ Blocks {}-{}: {} events applied (latest {}), {} users, {} days",
                            report.from_block,
                            report.to_block,
                            report.applied,
                            report.last_timestamp.map(block_date).unwrap_or_default(),
                            stats.users,
                            stats.history_buckets
                        );
                    }
                    persist(indexer.store(), data_dir.as_deref());
                }
                Ok(None) => {
                    tokio::time::sleep(config.poll_interval()).await;
                }
                Err(e) => {
                    error!("🔥 Stopping at block {}: {}", feed.next_block(), e);
                    persist(indexer.store(), data_dir.as_deref());
                    return Err(e.into());
                }
            },
            _ = &mut shutdown => {
                info!("📡 Received shutdown signal");
                break;
            }
        }
    }

    persist(indexer.store(), data_dir.as_deref());
    info!("✅ Bar indexer stopped gracefully");
    Ok(())
}
