use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use corpusprompt::{config::Config, snapshot::SnapshotTask};
use corpusprompt_server::{logging, router, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Config::load().context("Failed to load configuration")?;
    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::from_config(&config).context("Failed to build app state")?);

    if config.rehydrate_from_snapshot {
        state
            .snapshots
            .rehydrate(state.store())
            .await
            .context("Failed to rehydrate the corpus, the snapshot file was left untouched")?;
    }
    let snapshot_task = SnapshotTask::spawn(
        state.store().clone(),
        state.snapshots.clone(),
        config.snapshot_interval(),
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let app: Router = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    snapshot_task.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
