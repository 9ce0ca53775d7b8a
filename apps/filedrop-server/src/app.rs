//! Application orchestrator: wires the push server and the HTTP router.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use filedrop_push_server::{PushHub, PushServer, ServerConfig};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::routes::{self, AppState};

/// Runs the server until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let host = config.host_addr()?;
    tokio::fs::create_dir_all(&config.downloads_dir).await?;

    // -- Push server --
    let hub = PushHub::new();
    let push = PushServer::new(
        ServerConfig {
            host,
            port: config.push_port,
        },
        hub.clone(),
    );
    let push_run = Arc::clone(&push);
    let push_task = tokio::spawn(async move {
        if let Err(e) = push_run.run().await {
            tracing::error!("push server error: {e}");
        }
    });

    // -- HTTP --
    let state = AppState::new(
        PathBuf::from(&config.downloads_dir),
        config.owner.clone(),
        Arc::new(hub),
    )
    .with_interval(config.notification_interval());

    let listener = TcpListener::bind(SocketAddr::new(host, config.http_port)).await?;
    tracing::info!("http server listening on {}", listener.local_addr()?);

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    push.shutdown();
    if let Err(e) = push_task.await {
        tracing::error!("push server task failed: {e}");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
