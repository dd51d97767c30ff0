//! Upstream data sources and the models they produce
//!
//! This module contains the economic calendar resolver, the quote and headline
//! proxies, and the HTTP client they share.

pub mod calendar;
pub mod headlines;
pub mod partition;
pub mod quotes;
pub mod upstream;

pub use calendar::{CalendarQuery, CalendarResolver};
pub use headlines::HeadlineProxy;
pub use partition::WeekPartition;
pub use quotes::{normalize_symbols, QuoteProxy};
pub use upstream::{UpstreamClient, UpstreamConfig, UpstreamError};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of leading characters of the `date` field that hold `YYYY-MM-DD`
const DATE_PREFIX_LEN: usize = 10;

/// One economic calendar row exactly as the upstream sent it
///
/// The row is kept as raw JSON so every upstream field is passed through
/// untouched. The accessors read the few fields the resolver filters on; a
/// field that is absent or not a string reads as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarEvent(Value);

impl CalendarEvent {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Raw access to any upstream field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Event date/time, e.g. `2024-03-05T08:30:00-05:00`
    pub fn date(&self) -> Option<&str> {
        self.str_field("date")
    }

    /// Currency/country code, e.g. `USD`
    pub fn country(&self) -> Option<&str> {
        self.str_field("country")
    }

    /// Impact level: `High`, `Medium`, `Low` or `Holiday`
    pub fn impact(&self) -> Option<&str> {
        self.str_field("impact")
    }

    /// The first ten characters of the date field, compared as a string
    pub fn date_prefix(&self) -> Option<&str> {
        let date = self.date()?;
        Some(match date.char_indices().nth(DATE_PREFIX_LEN) {
            Some((idx, _)) => &date[..idx],
            None => date,
        })
    }

    /// The event instant parsed from the date field
    ///
    /// Accepts RFC 3339 timestamps, offset-less `YYYY-MM-DDTHH:MM[:SS]` (read
    /// as UTC) and bare dates (midnight UTC).
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let date = self.date()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
            return Some(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(date, format) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn event(value: Value) -> CalendarEvent {
        CalendarEvent::from_value(value)
    }

    #[test]
    fn test_accessors_read_string_fields() {
        let ev = event(json!({
            "title": "Non-Farm Employment Change",
            "country": "USD",
            "date": "2024-03-08T08:30:00-05:00",
            "impact": "High",
            "forecast": "200K",
            "previous": "353K"
        }));

        assert_eq!(ev.country(), Some("USD"));
        assert_eq!(ev.impact(), Some("High"));
        assert_eq!(ev.date_prefix(), Some("2024-03-08"));
        assert_eq!(ev.get("forecast"), Some(&json!("200K")));
    }

    #[test]
    fn test_missing_or_non_string_fields_read_as_none() {
        let ev = event(json!({"date": 20240308, "country": null}));
        assert!(ev.date().is_none());
        assert!(ev.date_prefix().is_none());
        assert!(ev.country().is_none());
        assert!(ev.impact().is_none());

        let not_an_object = event(json!(42));
        assert!(not_an_object.date().is_none());
    }

    #[test]
    fn test_short_date_prefix_is_whole_string() {
        let ev = event(json!({"date": "2024-03"}));
        assert_eq!(ev.date_prefix(), Some("2024-03"));
    }

    #[test]
    fn test_timestamp_formats() {
        let with_offset = event(json!({"date": "2024-03-05T08:30:00-05:00"}));
        assert_eq!(
            with_offset.timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 13, 30, 0).unwrap())
        );

        let naive = event(json!({"date": "2024-03-05T08:30:00"}));
        assert_eq!(
            naive.timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap())
        );

        let bare = event(json!({"date": "2024-03-05"}));
        assert_eq!(
            bare.timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );

        let garbage = event(json!({"date": "All Day"}));
        assert!(garbage.timestamp().is_none());
    }

    #[test]
    fn test_serialization_passes_row_through() {
        let row = json!({"date": "2024-03-05T08:30:00", "country": "USD", "extra": {"a": [1, 2]}});
        let ev: CalendarEvent = serde_json::from_value(row.clone()).unwrap();

        assert_eq!(serde_json::to_value(&ev).unwrap(), row);
        assert_eq!(ev.into_value(), row);
    }
}
