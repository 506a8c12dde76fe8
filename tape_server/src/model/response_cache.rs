//! Shared TTL response cache for the `/quotes` endpoint.
//!
//! The cache stores fully rendered response bodies keyed by request identity
//! (path plus normalized symbol list). Entries are written once per key per TTL
//! window and only read afterwards; a stale entry is treated as absent and is
//! dropped on the next read or by [`InMemoryResponseCache::purge_expired`].
//!
//! Handlers depend on the [`ResponseCache`] trait so an edge cache can be
//! plugged in without touching request handling.
//!
//! The in-memory cache holds at most `capacity` entries; storing a new key into
//! a full cache first drops expired entries, then the entry closest to expiry.
//!
//! Time is measured with `tokio::time::Instant`, which is monotonic and follows
//! the runtime clock (paused clocks in tests included).

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Default upper bound on stored responses.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Rendered body of a successful quotes response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Serialized JSON body.
    pub body: String,
}

/// Key-value store with per-entry lifetime.
pub trait ResponseCache: Send + Sync {
    /// Fetch a live entry.
    fn get(&self, key: &str) -> Option<CachedResponse>;
    /// Store `response` under `key` for `ttl`, replacing any previous entry.
    fn put(&self, key: String, response: CachedResponse, ttl: Duration);
}

struct CacheEntry {
    response: CachedResponse,
    expires_at: Instant,
}

/// Process-local [`ResponseCache`] backed by a mutex-guarded map.
pub struct InMemoryResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
}

impl Default for InMemoryResponseCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl InMemoryResponseCache {
    /// Create an empty cache holding up to [`DEFAULT_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache holding up to `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, live or not yet purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ResponseCache for InMemoryResponseCache {
    fn get(&self, key: &str) -> Option<CachedResponse> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.response.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: String, response: CachedResponse, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            entries.retain(|_, entry| entry.expires_at > now);
            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(
            key,
            CacheEntry {
                response,
                expires_at: now + ttl,
            },
        );
    }
}
