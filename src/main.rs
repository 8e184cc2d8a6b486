use std::sync::Arc;

use anyhow::Context;
use roomrelay::{app, store::SqliteStore, AppState, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let store = SqliteStore::connect(&config.database_url, config.database_max_connections).await?;
    store.migrate().await.context("migrating message store")?;

    let addr = config.addr;
    let state = AppState::new(config, Arc::new(store));
    let registry = state.registry.clone();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "relay listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    registry.shutdown();
    Ok(())
}
