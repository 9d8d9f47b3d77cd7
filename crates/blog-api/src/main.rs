//! Blog API Server
//!
//! Configuration comes from the TOML file named by `BLOG_CONFIG` when set,
//! otherwise from the environment alone.
//!
//! Author: hephaex@gmail.com

use blog_api::{create_router, state::AppState};
use blog_core::config::LoggingConfig;
use blog_core::{AppConfig, PgStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &logging.level;
        format!("blog_api={level},blog_core={level},tower_http=debug,audit=info").into()
    });

    if logging.json_format {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::var("BLOG_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?,
        Err(_) => AppConfig::from_env()?,
    };

    init_tracing(&config.logging);
    tracing::info!(environment = %config.environment, "Configuration loaded");

    let store = PgStore::connect(&config.database).await?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState::new(config, store)?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Blog API Server starting on http://{}", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
