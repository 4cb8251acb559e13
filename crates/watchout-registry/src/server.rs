//! Running the registry service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{build_router, AppContext};
use crate::config::RegistryConfig;
use crate::error::Result;

/// Serve the HTTP API and the broadcast hub until Ctrl-C.
pub async fn run(config: RegistryConfig) -> Result<()> {
    let context = Arc::new(AppContext::default());

    let hub_listener = TcpListener::bind(config.broadcast_addr).await?;
    let hub = context.hub.clone();
    tokio::spawn(async move {
        if let Err(e) = hub.serve(hub_listener).await {
            warn!("Broadcast hub stopped: {}", e);
        }
    });

    let listener = TcpListener::bind(config.api_addr).await?;
    info!("Registry API listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(context))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Registry stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
