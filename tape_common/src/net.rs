//! Shared HTTP constants and small helpers used by server and client.
use std::time::Duration;

/// Default port the quote service listens on.
pub const DEFAULT_PORT: u16 = 8787;
/// Path segment the quote endpoint is served under.
pub const QUOTES_PATH: &str = "/quotes";
/// Query parameter carrying the comma-separated symbol list.
pub const SYMBOLS_PARAM: &str = "symbols";

/// Lifetime of a cached `/quotes` response.
pub const CACHE_TTL: Duration = Duration::from_secs(15);
/// Deadline for a single upstream quote lookup.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);
/// Default client poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// `content-type` sent with every service response.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// `cache-control` value for successful quote responses with the given TTL.
pub fn cache_control(ttl: Duration) -> String {
    format!("public, max-age={}", ttl.as_secs())
}

/// Helper to format an IP address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}

/// True for `/quotes` itself and any path whose last segment is `quotes`.
pub fn is_quotes_path(path: &str) -> bool {
    path.ends_with(QUOTES_PATH)
}
