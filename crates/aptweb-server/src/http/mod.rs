//! HTTP server implementation using axum.

use crate::error::ServerError;
use crate::server::AppState;
use aptweb_redirect::RedirectMetrics;
use axum::Router;
use axum::routing::{any, get};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod handlers;

/// Create the public router.
///
/// Everything under `/dists/` passes the filename allow-list and is then
/// redirected or proxied; any other path is served from `site_dir`.
pub fn create_router(state: Arc<AppState>, site_dir: &Path) -> Router {
    let dists = Router::new()
        .route("/dists/", any(handlers::handle_dists))
        .route("/dists/{*path}", any(handlers::handle_dists))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            handlers::filter_filename,
        ));

    dists
        .fallback_service(ServeDir::new(site_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the metrics router.
pub fn create_metrics_router(metrics: RedirectMetrics) -> Router {
    Router::new()
        .route("/metrics", get(handlers::handle_metrics))
        .with_state(metrics)
}

/// Start HTTP server.
///
/// # Errors
///
/// Returns `ServerError` if the server fails to bind or encounters a runtime error.
pub async fn start_server(
    bind_addr: SocketAddr,
    state: Arc<AppState>,
    site_dir: &Path,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let app = create_router(state, site_dir);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|source| ServerError::HttpBindFailed {
            addr: bind_addr,
            source,
        })?;

    tracing::info!("HTTP server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| ServerError::Shutdown(format!("HTTP server error: {e}")))?;

    Ok(())
}

/// Start metrics server.
///
/// # Errors
///
/// Returns `ServerError` if the server fails to bind or encounters a runtime error.
pub async fn start_metrics_server(
    bind_addr: SocketAddr,
    metrics: RedirectMetrics,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let app = create_metrics_router(metrics);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|source| ServerError::MetricsBindFailed {
            addr: bind_addr,
            source,
        })?;

    tracing::info!("Metrics server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| ServerError::Shutdown(format!("Metrics server error: {e}")))?;

    Ok(())
}
