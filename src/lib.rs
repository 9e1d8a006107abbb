pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod log;
pub mod money;
pub mod providers;
pub mod rate_provider;
pub mod resolver;

use crate::api::AppState;
use crate::cache::CatalogCache;
use crate::providers::pgold::PgoldProvider;
use crate::resolver::QuoteService;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Build the application state from config: provider -> cache -> service.
pub fn build_state(config: &config::AppConfig) -> Result<AppState> {
    let provider = PgoldProvider::new(
        &config.upstream.base_url,
        Duration::from_secs(config.upstream.timeout_secs),
    )?;
    let cache = CatalogCache::new(
        Arc::new(provider),
        Duration::from_secs(config.upstream.cache_ttl_secs),
    );
    Ok(AppState {
        service: Arc::new(QuoteService::new(cache)),
        debug: config.debug,
    })
}

pub async fn run(config_path: Option<&str>) -> Result<()> {
    info!("Rates service starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let listen_addr = config.listen_addr.clone();
    let app = api::router(build_state(&config)?);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;
    info!("Listening on http://{listen_addr}");

    axum::serve(listener, app).await.map_err(Into::into)
}
