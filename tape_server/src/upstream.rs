//! Upstream quote provider.
//!
//! `QuoteProvider` is the seam between the aggregator and the third-party quote
//! API. `FinnhubProvider` talks to a Finnhub-compatible `/quote` endpoint and
//! maps its `{ c, d, dp }` fields onto [`Quote`].
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tape_common::{Quote, Result, Symbol, TapeError};

/// Default base URL of the upstream API.
pub const DEFAULT_UPSTREAM_URL: &str = "https://finnhub.io/api/v1";

/// One quote lookup per call; implementations must not retry.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch and validate the current quote for `symbol`.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote>;
}

/// Upstream API credential. Never printed.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key, for building upstream requests only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True if the key is blank.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Raw upstream quote. Finnhub sends `null` for unknown fields.
#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    /// Current price.
    c: Option<f64>,
    /// Change.
    d: Option<f64>,
    /// Percent change.
    dp: Option<f64>,
}

impl FinnhubQuote {
    fn into_quote(self, symbol: &Symbol) -> Option<Quote> {
        Quote::new(symbol.as_str(), self.c?, self.d?, self.dp?)
    }
}

/// [`QuoteProvider`] backed by a Finnhub-compatible REST API.
pub struct FinnhubProvider {
    client: reqwest::Client,
    quote_url: String,
    api_key: ApiKey,
}

impl FinnhubProvider {
    /// Build a provider for `base_url` with a client-level request timeout.
    pub fn new(base_url: &str, api_key: ApiKey, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            quote_url: format!("{}/quote", base_url.trim_end_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote> {
        let response = self
            .client
            .get(&self.quote_url)
            .query(&[("symbol", symbol.as_str()), ("token", self.api_key.expose())])
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TapeError::UpstreamStatus {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let raw: FinnhubQuote = response
            .json()
            .await
            .map_err(|_| TapeError::UpstreamPayload(symbol.to_string()))?;
        raw.into_quote(symbol)
            .ok_or_else(|| TapeError::UpstreamPayload(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn symbol(text: &str) -> Symbol {
        Symbol::parse(text).unwrap()
    }

    async fn provider_for(server: &MockServer) -> FinnhubProvider {
        FinnhubProvider::new(&server.uri(), ApiKey::new("secret"), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn maps_upstream_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .and(query_param("symbol", "AAPL"))
            .and(query_param("token", "secret"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "c": 189.84, "d": 1.12, "dp": 0.5934, "h": 190.1, "l": 187.2, "o": 188.0, "pc": 188.72
            })))
            .expect(1)
            .mount(&server)
            .await;

        let quote = provider_for(&server).await.fetch_quote(&symbol("AAPL")).await.unwrap();
        assert_eq!(quote, Quote::new("AAPL", 189.84, 1.12, 0.5934).unwrap());
    }

    #[tokio::test]
    async fn non_ok_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(path("/quote"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.fetch_quote(&symbol("MSFT")).await.unwrap_err();
        assert!(matches!(err, TapeError::UpstreamStatus { status: 429, .. }));
    }

    #[tokio::test]
    async fn unknown_symbol_with_zero_price_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(path("/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "c": 0, "d": null, "dp": null
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.fetch_quote(&symbol("ZZZZ")).await.unwrap_err();
        assert!(matches!(err, TapeError::UpstreamPayload(s) if s == "ZZZZ"));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(path("/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.fetch_quote(&symbol("NVDA")).await.unwrap_err();
        assert!(matches!(err, TapeError::UpstreamPayload(_)));
    }

    #[test]
    fn api_key_debug_is_redacted() {
        assert_eq!(format!("{:?}", ApiKey::new("secret")), "ApiKey([REDACTED])");
    }
}
