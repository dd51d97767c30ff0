//! Shared handler state

use std::sync::Arc;

use crate::cli::ServerConfig;
use crate::data::{CalendarResolver, HeadlineProxy, QuoteProxy, UpstreamClient, UpstreamError};

/// Proxies shared by every request
///
/// All three share one `UpstreamClient`, and therefore one connection pool.
#[derive(Clone)]
pub struct AppState {
    pub calendar: Arc<CalendarResolver>,
    pub quotes: Arc<QuoteProxy>,
    pub headlines: Arc<HeadlineProxy>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(config.upstream.clone())?;

        Ok(Self {
            calendar: Arc::new(CalendarResolver::new(upstream.clone(), config.calendar_ttl)),
            quotes: Arc::new(QuoteProxy::new(
                upstream.clone(),
                config.quote_ttl,
                config.quote_cache_capacity,
            )),
            headlines: Arc::new(HeadlineProxy::new(upstream, config.feed_ttl)),
        })
    }
}
