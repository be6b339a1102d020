mod app;
mod models;
mod handlers;
mod services;
mod middleware;
mod config;
mod errors;

use anyhow::Context;
use std::sync::Arc;
use crate::{
    app::AppState,
    config::{Config, StorageBackend},
    services::{seed, MemoryStore, RedisService, Store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    let store: Arc<dyn Store> = match config.storage.backend {
        StorageBackend::Redis => {
            let url = if config.redis.sentinel_enabled {
                config.redis.sentinel_url.clone().context("Sentinel URL not configured")?
            } else {
                config.redis.url.clone()
            };
            let client = redis::Client::open(url).context("Failed to create Redis client")?;
            Arc::new(RedisService::new(Arc::new(client), config.redis.key_prefix.clone()))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, nothing will survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store.clone(), config.clone());

    // Reference rows and the default user
    seed::seed_reference_data(store.as_ref(), &config.seed)
        .await
        .context("Failed to seed reference data")?;
    seed::ensure_default_user(&state.auth, &config.seed)
        .await
        .context("Failed to create default user")?;

    tokio::fs::create_dir_all(&config.resources.dir)
        .await
        .with_context(|| format!("Failed to create resources directory {}", config.resources.dir))?;

    let app = app::build_router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind server to {}", address))?;

    tracing::info!("Server running on {}", address);
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
