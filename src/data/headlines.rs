//! Headline feed proxy
//!
//! Caches the single RSS document as opaque text.

use chrono::Duration;

use super::upstream::{UpstreamClient, UpstreamError};
use crate::cache::CacheManager;

/// Cache key of the one feed document
const FEED_CACHE_KEY: &str = "headline_feed";

/// Default freshness of the feed document
pub const FEED_TTL_SECS: i64 = 60;

/// Cached access to the headline feed
pub struct HeadlineProxy {
    upstream: UpstreamClient,
    cache: CacheManager<&'static str, String>,
    ttl: Duration,
}

impl HeadlineProxy {
    pub fn new(upstream: UpstreamClient, ttl: Duration) -> Self {
        Self {
            upstream,
            cache: CacheManager::new(),
            ttl,
        }
    }

    /// The feed document, from cache when fresh
    pub async fn headlines(&self) -> Result<String, UpstreamError> {
        let upstream = &self.upstream;
        self.cache
            .get_or_refresh(FEED_CACHE_KEY, self.ttl, move || async move {
                upstream.fetch_headlines().await
            })
            .await
    }
}
