//! HTTP client for the three upstream sources
//!
//! The calendar fetch never fails: any problem degrades to an empty week.
//! Quote and headline fetches report failures so the caller can answer 502.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

use super::partition::WeekPartition;
use super::CalendarEvent;

/// Base URL for the weekly economic calendar files
pub const CALENDAR_BASE_URL: &str = "https://nfs.faireconomy.media";

/// Quote endpoint
pub const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// S&P 500 headline RSS feed
pub const FEED_URL: &str =
    "https://feeds.finance.yahoo.com/rss/2.0/headline?s=%5EGSPC&region=US&lang=en-US";

/// Default deadline for any single outbound call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The quote and feed hosts answer more reliably to a browser user agent
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36";

const QUOTE_ACCEPT: &str = "application/json,text/plain,*/*";
const FEED_ACCEPT: &str = "application/rss+xml, application/xml;q=0.9, */*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Errors that can occur when fetching quotes or headlines
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status
    #[error("upstream returned HTTP {0}")]
    Status(StatusCode),

    /// The call did not complete within the configured deadline
    #[error("upstream request timed out")]
    Timeout,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::RequestFailed(err)
        }
    }
}

impl UpstreamError {
    /// The upstream HTTP status, when the upstream answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Status(status) => Some(*status),
            _ => None,
        }
    }
}

/// Endpoints and limits for the upstream sources
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub calendar_base_url: String,
    pub quote_url: String,
    pub feed_url: String,
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            calendar_base_url: CALENDAR_BASE_URL.to_string(),
            quote_url: QUOTE_URL.to_string(),
            feed_url: FEED_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Client for the calendar, quote and headline sources
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    /// Create a new UpstreamClient with the given endpoints
    ///
    /// Fails only if the underlying HTTP client cannot be built (TLS backend
    /// initialisation).
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// URL of the weekly calendar file for `partition`
    pub fn week_url(&self, partition: WeekPartition) -> String {
        format!(
            "{}/ff_calendar_{}.json",
            self.config.calendar_base_url.trim_end_matches('/'),
            partition.file_suffix()
        )
    }

    /// Fetch one weekly calendar file
    ///
    /// Returns an empty list when the request fails, times out, answers with
    /// a non-success status, or the body is not a JSON array.
    pub async fn fetch_week(&self, partition: WeekPartition) -> Vec<CalendarEvent> {
        let url = self.week_url(partition);
        tracing::info!(%partition, %url, "fetching calendar week");

        match self.try_fetch_week(&url).await {
            Ok(events) => {
                tracing::debug!(%partition, count = events.len(), "calendar week loaded");
                events
            }
            Err(err) => {
                tracing::warn!(%partition, error = %err, "calendar fetch failed, treating week as empty");
                Vec::new()
            }
        }
    }

    async fn try_fetch_week(&self, url: &str) -> Result<Vec<CalendarEvent>, UpstreamError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(%status, body = excerpt(&text, 200), "calendar upstream error");
            return Err(UpstreamError::Status(status));
        }

        let body: Value = serde_json::from_str(&text)?;
        Ok(parse_week(body))
    }

    /// Fetch quotes for a normalized, comma-joined symbol list
    pub async fn fetch_quotes(&self, symbols: &str) -> Result<Value, UpstreamError> {
        tracing::info!(symbols, "fetching quotes");

        let response = self
            .client
            .get(&self.config.quote_url)
            .query(&[("symbols", symbols)])
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ACCEPT, QUOTE_ACCEPT)
            .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!(%status, body = excerpt(&text, 300), "quote fetch failed");
            return Err(UpstreamError::Status(status));
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch the raw headline feed document
    pub async fn fetch_headlines(&self) -> Result<String, UpstreamError> {
        tracing::info!(url = %self.config.feed_url, "fetching headline feed");

        let response = self
            .client
            .get(&self.config.feed_url)
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ACCEPT, FEED_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!(%status, body = excerpt(&text, 200), "headline feed fetch failed");
            return Err(UpstreamError::Status(status));
        }

        Ok(text)
    }
}

/// Turns a decoded calendar body into events; anything but an array is empty
fn parse_week(body: Value) -> Vec<CalendarEvent> {
    match body {
        Value::Array(rows) => rows.into_iter().map(CalendarEvent::from_value).collect(),
        _ => Vec::new(),
    }
}

/// First `max` characters of `text`, for logging
fn excerpt(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
