//! Workspace API server

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use che_rest_workspace::WorkspaceAccessor;

use crate::error::Error;
use crate::workspace::{get_workspace_handler, update_workspace_handler};

/// Shared state for handlers
#[derive(Clone)]
pub struct AppState {
    /// Read path for the served workspace
    pub accessor: Arc<WorkspaceAccessor>,
}

/// Router with every endpoint, CORS open to any origin, and request tracing
pub fn build_router(accessor: Arc<WorkspaceAccessor>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/api/workspace/{*key}",
            get(get_workspace_handler).put(update_workspace_handler),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { accessor })
}

/// Serve until `shutdown` resolves
pub async fn start_server(
    addr: SocketAddr,
    accessor: Arc<WorkspaceAccessor>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Error> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("failed to bind {}: {}", addr, e)))?;

    info!(%addr, workspace_id = %accessor.workspace_id(), "Starting workspace API server");

    axum::serve(listener, build_router(accessor))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

    info!("Workspace API server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
