//! HTTP surface: router, shared state and graceful shutdown.

mod handlers;
pub mod response;

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::query::QueryService;

pub use response::{ErrorResponse, RunQueryTemplateRequest, RunS3QueryTemplateRequest};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
    /// Cancelled when the server begins shutting down.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(service: Arc<QueryService>, shutdown: CancellationToken) -> Self {
        Self { service, shutdown }
    }
}

/// Builds the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/athena/run_query_template",
            post(handlers::run_query_template),
        )
        .route(
            "/athena/run_s3_query_template",
            post(handlers::run_s3_query_template),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Serves `router` until `signal` resolves.
///
/// Once the signal fires, `shutdown` is cancelled so in-flight waits end
/// promptly, then the server drains open connections.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
    signal: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {addr}");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal.await;
            info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
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
}
