//! Quote proxy
//!
//! Serves upstream quote JSON keyed by the normalized symbol list. Failed
//! fetches are returned to the caller and never cached.

use chrono::Duration;
use serde_json::Value;

use super::upstream::{UpstreamClient, UpstreamError};
use crate::cache::CacheManager;

/// Symbols used when the request names none
pub const DEFAULT_SYMBOLS: &str = "SPY,QQQ,^VIX";

/// Default freshness of a quote payload; short so prices stay live
pub const QUOTE_TTL_SECS: i64 = 5;

/// Default number of distinct symbol sets kept in memory
pub const QUOTE_CACHE_CAPACITY: usize = 256;

/// Canonical cache key for a symbol list
///
/// Splits on commas, trims each token, drops empty tokens and joins with
/// commas. Order and case are preserved. Falls back to `DEFAULT_SYMBOLS` when
/// nothing is left.
pub fn normalize_symbols(symbols: Option<&str>) -> String {
    let joined = symbols
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",");

    if joined.is_empty() {
        DEFAULT_SYMBOLS.to_string()
    } else {
        joined
    }
}

/// Cached access to the quote endpoint
pub struct QuoteProxy {
    upstream: UpstreamClient,
    cache: CacheManager<String, Value>,
    ttl: Duration,
}

impl QuoteProxy {
    pub fn new(upstream: UpstreamClient, ttl: Duration, capacity: usize) -> Self {
        Self {
            upstream,
            cache: CacheManager::with_capacity(capacity),
            ttl,
        }
    }

    /// Quote payload for the given raw `symbols` parameter
    pub async fn quotes(&self, symbols: Option<&str>) -> Result<Value, UpstreamError> {
        let key = normalize_symbols(symbols);
        let upstream = &self.upstream;
        let symbols = key.clone();
        self.cache
            .get_or_refresh(key, self.ttl, move || async move {
                upstream.fetch_quotes(&symbols).await
            })
            .await
    }

    /// Number of distinct symbol sets currently cached
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }
}
