//! eurekad - Eureka Streams activity server.
//!
//! Serves stream, start page and usage actions over HTTP, renders the
//! header bar, and runs the periodic maintenance tasks.

mod actions;
mod cache;
mod config;
mod db;
mod error;
mod http;
mod metrics;
mod stream;
mod tasks;
mod telemetry;
mod web;

use crate::actions::{Registry, Services, SystemClock};
use crate::cache::MemoryCache;
use crate::config::Config;
use crate::db::Database;
use crate::http::AppState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s)",
            errors.len()
        ));
    }

    info!(
        server = %config.server.name,
        listen = %config.server.listen,
        "Starting eurekad"
    );

    // Initialize database
    let db = Database::new(&config.database.path).await?;

    for account in &config.bootstrap.administrators {
        match db.people().ensure_administrator(account).await {
            Ok(true) => info!(account = %account, "Bootstrap administrator granted"),
            Ok(false) => {}
            Err(e) => warn!(account = %account, error = %e, "Failed to bootstrap administrator"),
        }
    }

    metrics::init();
    info!("Metrics initialized");

    let cache = Arc::new(MemoryCache::new(Duration::from_secs(config.cache.ttl_secs)));
    let services = Services::new(
        db.clone(),
        cache.clone(),
        Arc::new(SystemClock),
        config.usage.metric_retention_days,
    );
    let registry = Arc::new(Registry::new(&services));

    tasks::spawn_daily_summary_task(
        services.daily_usage_summary(),
        Duration::from_secs(config.usage.summary_interval_secs),
    );
    info!("Daily usage summary task started");

    tasks::spawn_cache_prune_task(
        cache,
        Duration::from_secs(config.cache.prune_interval_secs),
    );
    info!("Cache pruning task started");

    tasks::spawn_gadget_purge_task(
        db.clone(),
        services.clock.clone(),
        config.gadgets.undelete_window_days,
        Duration::from_secs(config.gadgets.purge_interval_secs),
    );
    info!("Deleted gadget purge task started");

    let state = AppState {
        db,
        registry,
        header: Arc::new(config.header.clone()),
    };
    http::run_http_server(config.server.listen, state).await;

    Ok(())
}
