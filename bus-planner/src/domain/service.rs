//! Service calendar records.

use chrono::{Datelike, NaiveDate};

/// A `calendar.txt` row: weekly pattern over a validity range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRule {
    pub service_id: String,
    /// Monday first.
    pub days: [bool; 7],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CalendarRule {
    /// Returns true if the weekly pattern runs on `date` within the range.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date
            && date <= self.end_date
            && self.days[date.weekday().num_days_from_monday() as usize]
    }
}

/// `calendar_dates.txt` exception type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    /// `1`: service added for the date.
    Added,
    /// `2`: service removed for the date.
    Removed,
}

impl ExceptionKind {
    pub fn from_gtfs(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(Self::Added),
            "2" => Some(Self::Removed),
            _ => None,
        }
    }
}

/// A `calendar_dates.txt` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarException {
    pub service_id: String,
    pub date: NaiveDate,
    pub kind: ExceptionKind,
}

/// Parse a feed date (`YYYYMMDD`).
///
/// ```
/// use bus_planner::domain::parse_feed_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(parse_feed_date("20250310"), NaiveDate::from_ymd_opt(2025, 3, 10));
/// assert_eq!(parse_feed_date("2025-03-10"), None);
/// ```
pub fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
}
