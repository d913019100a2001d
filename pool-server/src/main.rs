//! chatpool-server binary.
//!
//! Usage: `chatpool-server [config.toml]`

use anyhow::Context;
use pool_server::{build_router, AppState, Config, SqliteStorage};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(Path::new(&path))
            .with_context(|| format!("loading config from {path}"))?,
        None => Config::default(),
    };

    let storage = SqliteStorage::new(&config.storage.database)
        .await
        .context("opening database")?;
    tracing::info!(database = %config.storage.database.display(), "storage ready");

    let bind_address = config.server.bind_address.clone();
    let app = build_router(Arc::new(AppState { storage, config }));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;
    tracing::info!(addr = %listener.local_addr()?, "chatpool server listening");

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
