//! Zone rule resolution example
//!
//! This example demonstrates:
//! - Loading a registry configuration (file, `TZDB_*` environment, or a
//!   combined `tzdb.dat` archive)
//! - Resolving zone ids through a file system backed RuleStore
//! - Reading cache statistics
//!
//! Usage:
//!
//! ```text
//! cargo run --example resolve_zones -- <data-dir> [zone-id ...]
//! ```
//!
//! `<data-dir>` holds `tzdb/<zone id>.dat` files plus either `tzdb.yaml`
//! or `tzdb.dat`. With no zone ids every supported zone is preloaded.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tzdb_codec::TzdbArchive;
use tzdb_repository::{
    CacheableProvider, FileSystemProvider, RegistryConfig, RuleStore, ZoneRulesProvider,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if exists
    dotenvy::dotenv().ok();
    init_tracing()?;

    let mut args = std::env::args().skip(1);
    let data_dir = args.next().unwrap_or_else(|| ".".to_string());
    let zone_ids: Vec<String> = args.collect();

    let config = load_config(Path::new(&data_dir))?;
    info!(
        version = %config.version,
        zones = config.zone_ids.len(),
        "registry configured"
    );

    let provider = FileSystemProvider::new(&data_dir)
        .with_context(|| format!("Failed to open data directory {}", data_dir))?;
    let store = RuleStore::new(config, provider)?;

    if zone_ids.is_empty() {
        let loaded = store.preload(None).await?;
        println!("Preloaded {} zones", loaded);
    }

    for zone_id in &zone_ids {
        match store.versions_for(zone_id).await {
            Ok(history) => {
                for (version, rules) in &history {
                    let summary = serde_json::json!({
                        "zone_id": zone_id,
                        "version": version,
                        "fixed_offset": rules.is_fixed_offset(),
                        "standard_transitions": rules.standard_transitions().len(),
                        "savings_transitions": rules.savings_transitions().len(),
                        "last_rules": rules.last_rules(),
                    });
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
            }
            Err(err) if err.is_packaging_defect() => {
                return Err(err).context("Zone data is not packaged");
            }
            Err(err) => eprintln!("{}: {}", zone_id, err),
        }
    }

    let stats = store.cache_stats();
    println!("\nCache:");
    println!("  Entries: {}", stats.entries);
    println!("  Hits: {}, Misses: {}", stats.hits, stats.misses);
    println!("  Fetches: {}, Failures: {}", stats.fetches, stats.failures);
    println!("  Hit rate: {:.2}%", stats.hit_rate() * 100.0);

    Ok(())
}

/// Prefer an explicit configuration file, fall back to the archive index
fn load_config(data_dir: &Path) -> Result<RegistryConfig> {
    let config_path = data_dir.join("tzdb.yaml");
    if config_path.exists() {
        return RegistryConfig::load(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()));
    }

    let archive_path = data_dir.join("tzdb.dat");
    let bytes = std::fs::read(&archive_path)
        .with_context(|| format!("No tzdb.yaml or tzdb.dat in {}", data_dir.display()))?;
    let archive = TzdbArchive::parse(&bytes)
        .with_context(|| format!("Failed to parse {}", archive_path.display()))?;
    Ok(RegistryConfig::from_archive(&archive))
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tzdb_repository=debug,tzdb_codec=debug,resolve_zones=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
