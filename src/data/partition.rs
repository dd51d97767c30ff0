//! Weekly calendar partitions
//!
//! The calendar feed publishes three overlapping weekly files. Which of them
//! to consult depends on how far the requested date is from today.

use std::fmt;

use chrono::{NaiveDate, Utc};
use chrono_tz::America::New_York;

/// Maximum distance in days at which a neighbouring week is consulted
pub const NEIGHBOUR_WINDOW_DAYS: i64 = 7;

/// One of the three weekly calendar files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeekPartition {
    Previous,
    Current,
    Next,
}

impl WeekPartition {
    /// Suffix used by the upstream file name (`ff_calendar_{suffix}.json`)
    pub fn file_suffix(self) -> &'static str {
        match self {
            WeekPartition::Previous => "lastweek",
            WeekPartition::Current => "thisweek",
            WeekPartition::Next => "nextweek",
        }
    }

    /// Ordered list of partitions to search for a date `offset` days from today
    ///
    /// `Current` always comes first. `Previous` follows for offsets in
    /// `-7..=-1`, `Next` for offsets in `1..=7`. Without an offset (the date
    /// could not be parsed) only `Current` is searched.
    pub fn candidates(offset: Option<i64>) -> Vec<WeekPartition> {
        let mut candidates = vec![WeekPartition::Current];
        match offset {
            Some(days) if (-NEIGHBOUR_WINDOW_DAYS..0).contains(&days) => {
                candidates.push(WeekPartition::Previous);
            }
            Some(days) if (1..=NEIGHBOUR_WINDOW_DAYS).contains(&days) => {
                candidates.push(WeekPartition::Next);
            }
            _ => {}
        }
        candidates
    }
}

impl fmt::Display for WeekPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_suffix())
    }
}

/// Today's date in New York, regardless of the host timezone
pub fn today_eastern() -> NaiveDate {
    Utc::now().with_timezone(&New_York).date_naive()
}

/// Signed whole-day distance from `today` to `date`
pub fn day_offset(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}
