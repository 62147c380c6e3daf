//! HTTP request handlers for the package repository endpoints.

use crate::server::AppState;
use aptweb_redirect::{Dispatch, RedirectMetrics};
use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Body of the 404 answer for names outside the allow-list.
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Reject `/dists/` requests whose file name is not allow-listed.
///
/// Rejected requests never reach the redirector or the origin.
pub async fn filter_filename(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.filter().accepts_path(request.uri().path()) {
        tracing::debug!("Rejecting non-allowed path: {}", request.uri().path());
        return (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response();
    }

    next.run(request).await
}

/// Handle any request under `/dists/`.
///
/// Answers with `307 Temporary Redirect` to the release asset when the catalog
/// has one and the client can follow it; otherwise forwards the unchanged
/// request to the origin.
pub async fn handle_dists(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());

    let decision = state
        .redirector()
        .dispatch(request.uri().path(), user_agent);

    match decision {
        Dispatch::Redirect(target) => Redirect::temporary(&target.url).into_response(),
        Dispatch::Proxy(_) => state.proxy().forward(request).await,
    }
}

/// Handle GET /metrics.
pub async fn handle_metrics(State(metrics): State<RedirectMetrics>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        metrics.gather(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use aptweb_redirect::{Asset, CatalogMerger, CatalogStore};
    use axum::body::Body;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    async fn create_test_state() -> Arc<AppState> {
        let mut merger = CatalogMerger::new();
        merger.add_asset(Asset {
            name: "syncthing_1.27.0_amd64.deb".to_string(),
            download_url: "https://cdn.example/syncthing_1.27.0_amd64.deb".to_string(),
            size: 9000,
        });
        let store = Arc::new(CatalogStore::new());
        store.publish(merger.finish());

        let config = ServerConfig::try_parse_from(["aptweb", "--dists-host", "http://127.0.0.1:1"])
            .unwrap();
        Arc::new(AppState::new(&config, store, RedirectMetrics::new().unwrap()).unwrap())
    }

    fn request(path: &str, user_agent: &str) -> Request {
        Request::builder()
            .uri(path)
            .header(header::USER_AGENT, user_agent)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_handle_dists_redirects() {
        let state = create_test_state().await;
        let response = handle_dists(
            State(state),
            request("/dists/syncthing_1.27.0_amd64.deb", "curl/8.5.0"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://cdn.example/syncthing_1.27.0_amd64.deb"
        );
    }

    #[tokio::test]
    async fn test_handle_dists_old_apt_proxied() {
        let state = create_test_state().await;
        let response = handle_dists(
            State(Arc::clone(&state)),
            request(
                "/dists/syncthing_1.27.0_amd64.deb",
                "Debian APT-HTTP/1.3 (1.8.2)",
            ),
        )
        .await;

        // Origin is unreachable, so the proxy path shows up as 502
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            state.redirector().metrics().file_requests("compat_proxy"),
            1
        );
    }

    #[tokio::test]
    async fn test_handle_metrics() {
        let metrics = RedirectMetrics::new().unwrap();
        metrics.record_redirect(10);

        let response = handle_metrics(State(metrics)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("aptweb_redirects_total 1"));
    }
}
