//! Economic calendar resolver
//!
//! Finds the events for one day by consulting the weekly calendar files in
//! order, then narrows them by country and impact and sorts them by time.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use super::partition::{day_offset, today_eastern, WeekPartition};
use super::upstream::UpstreamClient;
use super::CalendarEvent;
use crate::cache::CacheManager;

/// Default freshness of a weekly calendar file
pub const CALENDAR_TTL_SECS: i64 = 10 * 60;

/// Query parameters of a calendar lookup
///
/// `countries` and `imp` are comma-separated and matched case-insensitively.
/// Absent or blank values leave that filter off.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarQuery {
    /// Requested day as `YYYY-MM-DD`; today in New York when absent
    pub date: Option<String>,
    pub countries: Option<String>,
    pub imp: Option<String>,
}

impl CalendarQuery {
    pub fn for_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    pub fn countries(&self) -> Vec<String> {
        split_csv(self.countries.as_deref())
    }

    pub fn impacts(&self) -> Vec<String> {
        split_csv(self.imp.as_deref())
    }
}

fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolves calendar queries against cached weekly files
pub struct CalendarResolver {
    upstream: UpstreamClient,
    cache: CacheManager<WeekPartition, Arc<Vec<CalendarEvent>>>,
    ttl: Duration,
}

impl CalendarResolver {
    pub fn new(upstream: UpstreamClient, ttl: Duration) -> Self {
        Self {
            upstream,
            cache: CacheManager::new(),
            ttl,
        }
    }

    /// The rows of one weekly file, from cache when fresh
    ///
    /// A failed fetch yields an empty week, which is cached like any other
    /// result until the TTL runs out.
    pub async fn load_week(&self, partition: WeekPartition) -> Arc<Vec<CalendarEvent>> {
        let upstream = &self.upstream;
        self.cache
            .get_or_refresh(partition, self.ttl, move || async move {
                Ok(Arc::new(upstream.fetch_week(partition).await))
            })
            .await
            .unwrap_or_else(|never: std::convert::Infallible| match never {})
    }

    /// Events for the requested day, relative to today in New York
    pub async fn resolve(&self, query: &CalendarQuery) -> Vec<CalendarEvent> {
        self.resolve_on(query, today_eastern()).await
    }

    /// Events for the requested day, with `today` supplied by the caller
    pub async fn resolve_on(&self, query: &CalendarQuery, today: NaiveDate) -> Vec<CalendarEvent> {
        let date = query
            .date
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

        let offset = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .ok()
            .map(|requested| day_offset(requested, today));
        let candidates = WeekPartition::candidates(offset);

        tracing::info!(
            %date,
            %today,
            offset = ?offset,
            candidates = ?candidates,
            "resolving calendar request"
        );

        let mut events = Vec::new();
        for partition in candidates {
            let week = self.load_week(partition).await;
            let subset = events_on(&week, &date);
            if !subset.is_empty() {
                tracing::info!(%date, %partition, count = subset.len(), "found calendar events");
                events = subset;
                break;
            }
        }

        let mut events = apply_filters(events, &query.countries(), &query.impacts());
        sort_by_time(&mut events);
        events
    }
}

/// Rows whose date prefix equals `date`; rows without a date never match
pub fn events_on(week: &[CalendarEvent], date: &str) -> Vec<CalendarEvent> {
    week.iter()
        .filter(|ev| ev.date_prefix() == Some(date))
        .cloned()
        .collect()
}

/// Keeps rows matching every non-empty filter list
pub fn apply_filters(
    events: Vec<CalendarEvent>,
    countries: &[String],
    impacts: &[String],
) -> Vec<CalendarEvent> {
    events
        .into_iter()
        .filter(|ev| matches_any(ev.country(), countries))
        .filter(|ev| matches_any(ev.impact(), impacts))
        .collect()
}

fn matches_any(value: Option<&str>, wanted: &[String]) -> bool {
    if wanted.is_empty() {
        return true;
    }
    match value {
        Some(value) => wanted.iter().any(|w| w.eq_ignore_ascii_case(value)),
        None => false,
    }
}

/// Stable ascending sort by event time; unparseable times go last
pub fn sort_by_time(events: &mut [CalendarEvent]) {
    events.sort_by_cached_key(|ev| {
        let ts = ev.timestamp();
        (ts.is_none(), ts)
    });
}
