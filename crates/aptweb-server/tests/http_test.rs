//! Integration tests for the public HTTP router.
//!
//! These tests start a real HTTP server in front of a mock origin and a mock
//! release feed, and make actual requests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use aptweb_redirect::{
    CatalogBuilder, CatalogRefresher, CatalogStore, FeedClient, FeedConfig, RedirectMetrics,
};
use aptweb_server::{AppState, ServerConfig};
use axum::http::StatusCode;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NEW_APT: &str = "Debian APT-HTTP/1.3 (2.4.13)";
const OLD_APT: &str = "Debian APT-HTTP/1.3 (1.6.18)";

struct TestServer {
    addr: SocketAddr,
    origin: MockServer,
    metrics: RedirectMetrics,
    _feed: MockServer,
    _site: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn mock_feed() -> MockServer {
    let feed = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/syncthing/syncthing/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"tag_name": "v1.28.0-rc.1", "assets": [
                {"name": "syncthing_1.28.0.rc.1_amd64.deb",
                 "browser_download_url": "https://cdn.example/v1.28.0-rc.1/syncthing_1.28.0.rc.1_amd64.deb",
                 "size": 2000}
            ]},
            {"tag_name": "v1.27.0", "assets": [
                {"name": "syncthing_1.27.0_amd64.deb",
                 "browser_download_url": "https://cdn.example/v1.27.0/syncthing_1.27.0_amd64.deb",
                 "size": 1000},
                {"name": "sha256sum.txt.asc",
                 "browser_download_url": "https://cdn.example/v1.27.0/sha256sum.txt.asc",
                 "size": 10}
            ]}
        ])))
        .mount(&feed)
        .await;
    feed
}

async fn mock_origin() -> MockServer {
    let origin = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dists/syncthing_1.27.0_amd64.deb"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"!<arch>\n".to_vec()))
        .mount(&origin)
        .await;

    Mock::given(method("GET"))
        .and(path("/dists/not-allowed.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&origin)
        .await;

    origin
}

/// Start test HTTP server on random port with a populated catalog.
async fn start_test_server() -> TestServer {
    aptweb_redirect::ensure_crypto_provider();

    let feed = mock_feed().await;
    let origin = mock_origin().await;

    let site = TempDir::new().expect("Failed to create site directory");
    std::fs::write(site.path().join("index.html"), "<h1>aptweb</h1>\n")
        .expect("Failed to write index.html");

    let config = ServerConfig::try_parse_from([
        "aptweb",
        "--dists-host",
        &origin.uri(),
        "--release-feed",
        &format!("{}/repos/syncthing/syncthing/releases", feed.uri()),
        "--site-dir",
        site.path().to_str().expect("Site path is not UTF-8"),
    ])
    .expect("Failed to parse test configuration");
    config.validate().expect("Test configuration is invalid");

    let metrics = RedirectMetrics::new().expect("Failed to create metrics");
    let store = Arc::new(CatalogStore::new());
    let refresher = CatalogRefresher::new(
        CatalogBuilder::new(
            config.release_feeds.clone(),
            FeedClient::new(&FeedConfig::default()).expect("Failed to create feed client"),
        ),
        Arc::clone(&store),
        Duration::from_secs(300),
        metrics.clone(),
    );
    refresher
        .refresh_once()
        .await
        .expect("Failed to build catalog");

    let state = Arc::new(
        AppState::new(&config, store, metrics.clone()).expect("Failed to initialize AppState"),
    );
    let app = aptweb_server::http::create_router(state, &config.site_dir);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind HTTP listener");
    let addr = listener
        .local_addr()
        .expect("Failed to get listener address");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("HTTP server failed");
    });

    TestServer {
        addr,
        origin,
        metrics,
        _feed: feed,
        _site: site,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build HTTP client")
}

async fn get(server: &TestServer, path: &str, user_agent: &str) -> reqwest::Response {
    client()
        .get(server.url(path))
        .header(reqwest::header::USER_AGENT, user_agent)
        .send()
        .await
        .expect("Request failed")
}

#[tokio::test]
async fn test_catalog_hit_redirects() {
    let server = start_test_server().await;

    let response = get(&server, "/dists/syncthing_1.27.0_amd64.deb", NEW_APT).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()["location"],
        "https://cdn.example/v1.27.0/syncthing_1.27.0_amd64.deb"
    );
    assert_eq!(server.metrics.redirects(), 1);
}

#[tokio::test]
async fn test_tilde_version_redirects_to_dotted_asset() {
    let server = start_test_server().await;

    for path in [
        "/dists/syncthing_1.28.0~rc.1_amd64.deb",
        "/dists/syncthing_1.28.0%7Erc.1_amd64.deb",
    ] {
        let response = get(&server, path, NEW_APT).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(
            response.headers()["location"],
            "https://cdn.example/v1.28.0-rc.1/syncthing_1.28.0.rc.1_amd64.deb"
        );
    }
}

#[tokio::test]
async fn test_old_apt_is_proxied() {
    let server = start_test_server().await;

    let response = get(&server, "/dists/syncthing_1.27.0_amd64.deb", OLD_APT).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"!<arch>\n");
    assert_eq!(server.metrics.redirects(), 0);
    assert_eq!(server.metrics.file_requests("compat_proxy"), 1);
}

#[tokio::test]
async fn test_index_files_proxied_and_cached() {
    let server = start_test_server().await;
    Mock::given(method("GET"))
        .and(path("/dists/syncthing/Release"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Suite: syncthing\n"))
        .expect(1)
        .mount(&server.origin)
        .await;

    for _ in 0..2 {
        let response = get(&server, "/dists/syncthing/Release", NEW_APT).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "Suite: syncthing\n");
    }

    assert_eq!(server.metrics.file_requests("proxy"), 2);
    server.origin.verify().await;
}

#[tokio::test]
async fn test_catalog_miss_relays_origin_status() {
    let server = start_test_server().await;

    let response = get(&server, "/dists/syncthing_0.1.0_amd64.deb", NEW_APT).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.metrics.file_requests("proxy"), 1);
}

#[tokio::test]
async fn test_non_allowed_name_rejected() {
    let server = start_test_server().await;

    for path in ["/dists/not-allowed.txt", "/dists/sha256sum.txt.asc", "/dists/"] {
        let response = get(&server, path, NEW_APT).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert_eq!(response.text().await.unwrap(), "404 page not found\n");
    }

    assert_eq!(server.metrics.file_requests("proxy"), 0);
}

#[tokio::test]
async fn test_static_site_served() {
    let server = start_test_server().await;

    let response = get(&server, "/", "curl/8.5.0").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "<h1>aptweb</h1>\n");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let metrics = RedirectMetrics::new().unwrap();
    metrics.record_redirect(1000);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = aptweb_server::http::create_metrics_router(metrics);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let body = client()
        .get(format!("http://{addr}/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("aptweb_redirects_total 1"));
    assert!(body.contains("aptweb_redirect_bytes_total 1000"));
}
