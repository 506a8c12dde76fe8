//! Validated service configuration.
use std::net::SocketAddr;
use std::time::Duration;

use tape_common::{Result, TapeError};

use crate::args::Args;
use crate::upstream::ApiKey;

/// Runtime configuration of the quote service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub bind: SocketAddr,
    /// Upstream API base URL.
    pub upstream_url: String,
    /// Upstream credential.
    pub api_key: ApiKey,
    /// Response cache lifetime.
    pub cache_ttl: Duration,
    /// Per-lookup upstream deadline.
    pub upstream_timeout: Duration,
}

impl ServerConfig {
    /// Validate parsed arguments.
    pub fn from_args(args: Args) -> Result<Self> {
        let bind: SocketAddr = args
            .bind
            .trim()
            .parse()
            .map_err(|e| TapeError::Config(format!("invalid bind address {:?}: {}", args.bind, e)))?;

        let api_key = ApiKey::new(args.api_key.trim());
        if api_key.is_empty() {
            return Err(TapeError::Config("upstream API key is empty".to_string()));
        }

        let upstream_url = args.upstream_url.trim().to_string();
        if !upstream_url.starts_with("http://") && !upstream_url.starts_with("https://") {
            return Err(TapeError::Config(format!(
                "upstream URL must be http(s): {:?}",
                upstream_url
            )));
        }

        if args.cache_ttl_secs == 0 {
            return Err(TapeError::Config("cache TTL must be positive".to_string()));
        }
        if args.upstream_timeout_ms == 0 {
            return Err(TapeError::Config("upstream timeout must be positive".to_string()));
        }

        Ok(Self {
            bind,
            upstream_url,
            api_key,
            cache_ttl: Duration::from_secs(args.cache_ttl_secs),
            upstream_timeout: Duration::from_millis(args.upstream_timeout_ms),
        })
    }
}
