//! Caching reverse proxy to the origin object store.
//!
//! Requests are forwarded with their method, path, query, headers and body.
//! `200 OK` answers to plain GETs whose size is known and small enough are
//! kept in a [`TtlCache`] keyed by the upstream URL; everything else, range
//! requests included, is streamed through.

use crate::error::ServerError;
use aptweb_cache::{TtlCache, TtlCacheConfig};
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::time::Duration;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Request bodies are buffered before forwarding; APT only sends GET and HEAD.
const MAX_REQUEST_BODY: usize = 1024 * 1024;

/// Headers that describe one connection and are never forwarded.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Origin response held in the cache.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Origin status
    pub status: StatusCode,
    /// Origin headers without hop-by-hop headers
    pub headers: HeaderMap,
    /// Full body
    pub body: Bytes,
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Reverse proxy with a response cache in front of the origin.
#[derive(Debug)]
pub struct CachingProxy {
    client: reqwest::Client,
    origin: Url,
    cache: TtlCache<String, CachedResponse>,
    max_entry_bytes: usize,
}

impl CachingProxy {
    /// Create a proxy for `origin`.
    ///
    /// Starts the cache sweeper, so this must run inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the HTTP client cannot be built or the cache
    /// configuration is invalid.
    pub fn new(
        origin: Url,
        cache_config: TtlCacheConfig,
        max_entry_bytes: usize,
    ) -> Result<Self, ServerError> {
        aptweb_redirect::ensure_crypto_provider();

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .build()
            .map_err(ServerError::OriginClient)?;

        let cache = TtlCache::new_with_cleanup(cache_config)?;

        Ok(Self {
            client,
            origin,
            cache,
            max_entry_bytes,
        })
    }

    /// Origin base URL.
    pub const fn origin(&self) -> &Url {
        &self.origin
    }

    /// Response cache.
    pub const fn cache(&self) -> &TtlCache<String, CachedResponse> {
        &self.cache
    }

    /// Upstream URL for a request URI: origin path prefix, request path and
    /// query.
    pub fn upstream_url(&self, uri: &Uri) -> Url {
        let mut url = self.origin.clone();
        let prefix = self.origin.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{}", uri.path()));
        url.set_query(uri.query());
        url
    }

    /// Forward a request to the origin and relay the answer.
    ///
    /// Origin failures become `502 Bad Gateway`.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let url = self.upstream_url(request.uri());
        let key = url.to_string();
        let cacheable = request.method() == Method::GET && !is_partial_request(request.headers());

        if cacheable {
            if let Some(cached) = self.cache.get(&key) {
                tracing::debug!(url = %key, "origin cache hit");
                return cached.into_response();
            }
        }

        let (parts, body) = request.into_parts();
        let Ok(body) = axum::body::to_bytes(body, MAX_REQUEST_BODY).await else {
            return (StatusCode::PAYLOAD_TOO_LARGE, "413 request body too large\n").into_response();
        };

        let upstream = self
            .client
            .request(parts.method, url)
            .headers(strip_hop_by_hop(parts.headers))
            .body(body)
            .send()
            .await;

        let upstream = match upstream {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %key, error = %e, "origin request failed");
                return bad_gateway();
            }
        };

        let status = upstream.status();
        let headers = strip_hop_by_hop(upstream.headers().clone());
        let fits = upstream
            .content_length()
            .is_some_and(|len| usize::try_from(len).is_ok_and(|len| len <= self.max_entry_bytes));

        if !(cacheable && status == StatusCode::OK && fits) {
            tracing::debug!(url = %key, status = status.as_u16(), "streaming origin response");
            let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            return response;
        }

        let body = match upstream.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url = %key, error = %e, "reading origin response failed");
                return bad_gateway();
            }
        };

        let cached = CachedResponse {
            status,
            headers,
            body,
        };
        self.cache.insert(key, cached.clone());
        cached.into_response()
    }
}

/// Range requests answer with a slice of the file and never touch the cache,
/// which holds complete bodies only.
fn is_partial_request(headers: &HeaderMap) -> bool {
    headers.contains_key(header::RANGE) || headers.contains_key(header::IF_RANGE)
}

fn strip_hop_by_hop(mut headers: HeaderMap) -> HeaderMap {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers
}

fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "502 bad gateway\n").into_response()
}
