//! HTTP surface of the quote service.
//!
//! Everything goes through a single fallback handler because the quotes
//! endpoint is matched by path suffix (`/quotes` or `.../quotes`) rather than by
//! an exact route:
//!
//! - `OPTIONS` (any path) → `204` preflight.
//! - any other non-`GET` method → `405`.
//! - `GET` outside a quotes path → `404`.
//! - `GET` quotes path without usable `symbols` → `400` with `quotes: []`.
//! - otherwise → `200 { quotes, updatedAt }`, served from the response cache
//!   when an identical request was answered within the TTL.
//!
//! Concurrent misses for the same cache key share one aggregation, so the
//! upstream sees a single set of lookups per key per TTL window.
//!
//! Every response carries permissive CORS headers and a JSON content type.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Query, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE,
        },
    },
    response::{IntoResponse, Response},
};
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, error};
use parking_lot::Mutex;
use serde::Serialize;
use tape_common::net::{JSON_CONTENT_TYPE, SYMBOLS_PARAM, cache_control, is_quotes_path};
use tape_common::tickers::{join_symbols, parse_symbols};
use tape_common::{ErrorBody, QuotesResponse, Symbol};

use crate::aggregator::QuoteAggregator;
use crate::model::response_cache::{CachedResponse, ResponseCache};

/// Rendered body of an aggregation in progress; `None` if rendering failed.
type PendingBody = Shared<BoxFuture<'static, Option<String>>>;

/// Shared state for the request handler.
#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<QuoteAggregator>,
    cache: Arc<dyn ResponseCache>,
    cache_ttl: Duration,
    in_flight: Arc<Mutex<HashMap<String, PendingBody>>>,
}

impl AppState {
    /// Wire an aggregator and a response cache together.
    pub fn new(aggregator: QuoteAggregator, cache: Arc<dyn ResponseCache>, cache_ttl: Duration) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            cache,
            cache_ttl,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Create the router serving the quote endpoint.
pub fn create_router(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

async fn dispatch(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method == Method::OPTIONS {
        return preflight();
    }
    if method != Method::GET {
        debug!("Rejecting {} {}", method, uri);
        return json_body(StatusCode::METHOD_NOT_ALLOWED, &ErrorBody::new("Method not allowed"));
    }
    if !is_quotes_path(uri.path()) {
        debug!("No route for {}", uri.path());
        return json_body(StatusCode::NOT_FOUND, &ErrorBody::new("Not found"));
    }

    let symbols = requested_symbols(&uri);
    if symbols.is_empty() {
        return json_body(
            StatusCode::BAD_REQUEST,
            &ErrorBody::with_empty_quotes("Missing symbols"),
        );
    }

    serve_quotes(&state, uri.path(), &symbols).await
}

/// Normalized `symbols` parameter; empty when missing or unparsable.
fn requested_symbols(uri: &Uri) -> Vec<Symbol> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .ok()
        .and_then(|Query(params)| params.get(SYMBOLS_PARAM).map(|raw| parse_symbols(raw)))
        .unwrap_or_default()
}

/// Cache identity of a quotes request: path plus the normalized symbol list.
pub fn cache_key(path: &str, symbols: &[Symbol]) -> String {
    format!("{}?{}={}", path, SYMBOLS_PARAM, join_symbols(symbols))
}

async fn serve_quotes(state: &AppState, path: &str, symbols: &[Symbol]) -> Response {
    let key = cache_key(path, symbols);
    if let Some(cached) = state.cache.get(&key) {
        debug!("Cache hit for {}", key);
        return quotes_response(cached.body, state.cache_ttl);
    }

    let pending = {
        let mut in_flight = state.in_flight.lock();
        // The leader stores into the cache before leaving `in_flight`.
        if let Some(cached) = state.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return quotes_response(cached.body, state.cache_ttl);
        }
        match in_flight.get(&key) {
            Some(pending) => {
                debug!("Joining in-flight aggregation for {}", key);
                pending.clone()
            }
            None => {
                debug!("Cache miss for {}", key);
                let pending = render_quotes(state.clone(), key.clone(), symbols.to_vec())
                    .boxed()
                    .shared();
                in_flight.insert(key.clone(), pending.clone());
                pending
            }
        }
    };

    match pending.await {
        Some(body) => quotes_response(body, state.cache_ttl),
        None => internal_error(),
    }
}

/// Aggregate, render and cache one response, then release the in-flight slot.
async fn render_quotes(state: AppState, key: String, symbols: Vec<Symbol>) -> Option<String> {
    let quotes = state.aggregator.aggregate(&symbols).await;
    debug!("Aggregated {}/{} quotes for {}", quotes.len(), symbols.len(), key);

    let body = match serde_json::to_string(&QuotesResponse::now(quotes)) {
        Ok(body) => {
            state.cache.put(
                key.clone(),
                CachedResponse { body: body.clone() },
                state.cache_ttl,
            );
            Some(body)
        }
        Err(e) => {
            error!("Failed to serialize quotes response: {}", e);
            None
        }
    };
    state.in_flight.lock().remove(&key);
    body
}

fn quotes_response(body: String, ttl: Duration) -> Response {
    let mut response = raw_json(StatusCode::OK, body);
    if let Ok(value) = HeaderValue::from_str(&cache_control(ttl)) {
        response.headers_mut().insert(CACHE_CONTROL, value);
    }
    response
}

fn preflight() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    apply_common_headers(response.headers_mut());
    response
}

fn json_body<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_string(body) {
        Ok(json) => raw_json(status, json),
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    raw_json(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"error":"Internal error"}"#.to_string(),
    )
}

fn raw_json(status: StatusCode, body: String) -> Response {
    let mut response = (status, body).into_response();
    apply_common_headers(response.headers_mut());
    response
}

fn apply_common_headers(headers: &mut HeaderMap) {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::response_cache::InMemoryResponseCache;
    use crate::upstream::QuoteProvider;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tape_common::{Quote, Result, TapeError};
    use tower::ServiceExt;

    const TTL: Duration = Duration::from_secs(15);

    /// Quotes every symbol at 100.0 except `DOWN`, counting calls.
    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteProvider for CountingProvider {
        async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol.as_str() == "DOWN" {
                return Err(TapeError::UpstreamStatus {
                    symbol: symbol.to_string(),
                    status: 500,
                });
            }
            Ok(Quote::new(symbol.as_str(), 100.0, -0.5, -0.5).unwrap())
        }
    }

    fn app() -> (Router, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider::default());
        let aggregator = QuoteAggregator::new(provider.clone(), Duration::from_secs(5));
        let cache = Arc::new(InMemoryResponseCache::new());
        (create_router(AppState::new(aggregator, cache, TTL)), provider)
    }

    async fn send(app: Router, method: &str, uri: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_cors(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "content-type");
        assert_eq!(headers[CONTENT_TYPE], JSON_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn returns_quotes_with_cache_headers() {
        let (app, _) = app();
        let response = send(app, "GET", "/quotes?symbols=aapl,msft").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=15");

        let body = json(response).await;
        assert_eq!(body["quotes"].as_array().unwrap().len(), 2);
        assert_eq!(body["quotes"][0]["symbol"], "AAPL");
        assert_eq!(body["quotes"][0]["changePercent"], -0.5);
        assert!(body["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn nested_quotes_path_is_accepted() {
        let (app, _) = app();
        let response = send(app, "GET", "/api/tape/quotes?symbols=spy").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn all_upstream_failures_still_answer_ok() {
        let (app, _) = app();
        let response = send(app, "GET", "/quotes?symbols=down").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["quotes"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_or_empty_symbols_is_bad_request() {
        for uri in ["/quotes", "/quotes?symbols=", "/quotes?symbols=%20,%20,", "/quotes?other=1"] {
            let (app, provider) = app();
            let response = send(app, "GET", uri).await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_cors(&response);
            let body = json(response).await;
            assert_eq!(body["quotes"], serde_json::json!([]));
            assert_eq!(body["error"], "Missing symbols");
            assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let (app, _) = app();
        let response = send(app, "GET", "/prices?symbols=AAPL").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_cors(&response);
        let body = json(response).await;
        assert_eq!(body["error"], "Not found");
        assert!(body.get("quotes").is_none());
    }

    #[tokio::test]
    async fn non_get_method_is_rejected() {
        for method in ["POST", "PUT", "DELETE", "PATCH"] {
            let (app, _) = app();
            let response = send(app, method, "/quotes?symbols=AAPL").await;
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_cors(&response);
        }
    }

    #[tokio::test]
    async fn options_is_preflight_on_any_path() {
        for uri in ["/quotes", "/anything"] {
            let (app, provider) = app();
            let response = send(app, "OPTIONS", uri).await;
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
            assert_cors(&response);
            assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn duplicates_fan_out_once_per_symbol() {
        let (app, provider) = app();
        let response = send(app, "GET", "/quotes?symbols=aapl,AAPL,%20msft").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        let body = json(response).await;
        let symbols: Vec<_> = body["quotes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["symbol"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    }

    #[tokio::test]
    async fn long_lists_are_truncated() {
        let (app, provider) = app();
        let list = (0..30).map(|i| format!("t{i}")).collect::<Vec<_>>().join(",");
        let response = send(app, "GET", &format!("/quotes?symbols={list}")).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 25);
        assert_eq!(json(response).await["quotes"].as_array().unwrap().len(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn identical_requests_within_ttl_hit_cache() {
        let (app, provider) = app();

        let first = json(send(app.clone(), "GET", "/quotes?symbols=AAPL,MSFT").await).await;
        tokio::time::advance(Duration::from_secs(10)).await;
        let second = json(send(app.clone(), "GET", "/quotes?symbols=aapl,%20msft,AAPL").await).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(first, second);

        tokio::time::advance(Duration::from_secs(6)).await;
        send(app, "GET", "/quotes?symbols=AAPL,MSFT").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }

    /// Answers after a delay, counting calls.
    #[derive(Default)]
    struct SlowProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteProvider for SlowProvider {
        async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(Quote::new(symbol.as_str(), 42.0, 0.0, 0.0).unwrap())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_identical_requests_share_one_aggregation() {
        let provider = Arc::new(SlowProvider::default());
        let aggregator = QuoteAggregator::new(provider.clone(), Duration::from_secs(5));
        let state = AppState::new(aggregator, Arc::new(InMemoryResponseCache::new()), TTL);
        let app = create_router(state.clone());

        let (first, second) = tokio::join!(
            send(app.clone(), "GET", "/quotes?symbols=AAPL"),
            send(app.clone(), "GET", "/quotes?symbols=aapl"),
        );

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(json(first).await, json(second).await);
        assert!(state.in_flight.lock().is_empty());

        send(app, "GET", "/quotes?symbols=AAPL").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cache_key_uses_normalized_symbols() {
        let symbols = parse_symbols("msft, aapl,MSFT");
        assert_eq!(cache_key("/quotes", &symbols), "/quotes?symbols=MSFT,AAPL");
    }
}
