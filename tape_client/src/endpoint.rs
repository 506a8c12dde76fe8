//! Normalization of the configured quote service endpoint.
//!
//! The endpoint may be given loosely: a bare host gets `https://`, a path-only
//! value is resolved against an origin, and `/quotes` is appended unless the
//! path already ends with it.
use reqwest::Url;
use tape_common::net::{QUOTES_PATH, SYMBOLS_PARAM, is_quotes_path};
use tape_common::{Result, TapeError, Watchlist};

/// Absolute base URL of the quote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteEndpoint {
    base: Url,
}

impl QuoteEndpoint {
    /// Parse a configured endpoint; `origin` is only consulted for values starting with `/`.
    pub fn parse(raw: &str, origin: Option<&str>) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TapeError::InvalidEndpoint("endpoint is empty".to_string()));
        }

        let base = if raw.starts_with('/') {
            let origin = origin.ok_or_else(|| {
                TapeError::InvalidEndpoint(format!("relative endpoint {:?} needs an origin", raw))
            })?;
            parse_url(&with_scheme(origin.trim()))?
                .join(raw)
                .map_err(|e| TapeError::InvalidEndpoint(format!("{}: {}", raw, e)))?
        } else {
            parse_url(&with_scheme(raw))?
        };

        Ok(Self { base })
    }

    /// Base URL as configured (after normalization).
    pub fn as_str(&self) -> &str {
        self.base.as_str()
    }

    /// Full request URL for `watchlist`: quotes path plus `symbols` parameter.
    ///
    /// Any `symbols` already present on the base URL is replaced; other query
    /// parameters are kept.
    pub fn quotes_url(&self, watchlist: &Watchlist) -> Url {
        let mut url = self.base.clone();
        if !is_quotes_path(url.path()) {
            let path = format!("{}{}", url.path().trim_end_matches('/'), QUOTES_PATH);
            url.set_path(&path);
        }

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != SYMBOLS_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(SYMBOLS_PARAM, &watchlist.query_value());
        url
    }
}

fn with_scheme(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| TapeError::InvalidEndpoint(format!("{}: {}", raw, e)))
}
