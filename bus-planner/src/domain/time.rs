//! Service-day time handling.
//!
//! Feeds express stop times as `HH:MM:SS` measured from the midnight of the
//! service day. Trips that run past midnight keep counting, so `25:10:00` is
//! 01:10 on the following calendar day. Searches place those values on a
//! single timeline anchored at the requested date.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Largest hour value accepted in a stop time.
const MAX_HOURS: u32 = 99;

/// Seconds in one calendar day.
pub const DAY_SECS: i64 = 86_400;

/// A stop time in seconds since the service day's midnight.
///
/// Values above 86 400 are legal and mean the trip continues past midnight.
///
/// # Examples
///
/// ```
/// use bus_planner::domain::ServiceTime;
///
/// let t = ServiceTime::parse("25:10:00").unwrap();
/// assert_eq!(t.secs(), 90_600);
/// assert_eq!(t.to_string(), "25:10:00");
///
/// // Single-digit hours are common in real feeds
/// assert_eq!(ServiceTime::parse("8:15:00").unwrap().secs(), 29_700);
///
/// assert!(ServiceTime::parse("08:61:00").is_err());
/// assert!(ServiceTime::parse("").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Create from raw seconds.
    pub fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Create from hours, minutes and seconds.
    pub fn from_hms(h: u32, m: u32, s: u32) -> Self {
        Self(h * 3600 + m * 60 + s)
    }

    /// Parse `H:MM:SS` or `HH:MM:SS` (hours may exceed 23).
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), sec, None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(DomainError::InvalidTime(s.to_string()));
        };

        let hours = parse_field(h, MAX_HOURS).ok_or_else(|| DomainError::InvalidTime(s.into()))?;
        let minutes = parse_field(m, 59).ok_or_else(|| DomainError::InvalidTime(s.into()))?;
        let seconds = match sec {
            Some(sec) => parse_field(sec, 59).ok_or_else(|| DomainError::InvalidTime(s.into()))?,
            None => 0,
        };

        if m.len() != 2 || sec.is_some_and(|v| v.len() != 2) {
            return Err(DomainError::InvalidTime(s.to_string()));
        }

        Ok(Self::from_hms(hours, minutes, seconds))
    }

    /// Returns the seconds since the service day's midnight.
    pub fn secs(self) -> u32 {
        self.0
    }

    /// Returns the value on a timeline shifted by `offset` seconds.
    pub fn on_timeline(self, offset: i64) -> i64 {
        self.0 as i64 + offset
    }
}

fn parse_field(s: &str, max: u32) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok().filter(|v| *v <= max)
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0;
        write!(
            f,
            "{:02}:{:02}:{:02}",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        )
    }
}

/// Format a timeline value as a wall-clock `HH:MM`.
///
/// The day part is discarded, so `-600` (23:50 the day before) and
/// `87_000` (00:10 the day after) both format as clock times.
///
/// ```
/// use bus_planner::domain::format_clock;
///
/// assert_eq!(format_clock(29_700), "08:15");
/// assert_eq!(format_clock(90_600), "01:10");
/// assert_eq!(format_clock(-600), "23:50");
/// ```
pub fn format_clock(timeline_secs: i64) -> String {
    let secs = timeline_secs.rem_euclid(DAY_SECS);
    format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
}

/// Parse a request clock time (`HH:MM` or `HH:MM:SS`) into seconds.
pub fn parse_clock(s: &str) -> Result<i64, DomainError> {
    let t = ServiceTime::parse(s)?;
    if t.secs() as i64 >= DAY_SECS {
        return Err(DomainError::InvalidTime(s.to_string()));
    }
    Ok(t.secs() as i64)
}

/// Whether the rider fixes the departure or the arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Leave at or after the requested time.
    #[default]
    Depart,
    /// Arrive at or before the requested time.
    Arrive,
}

impl FromStr for SearchMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "depart" | "departure" | "depart_at" => Ok(Self::Depart),
            "arrive" | "arrival" | "arrive_by" => Ok(Self::Arrive),
            other => Err(DomainError::InvalidMode(other.to_string())),
        }
    }
}

/// An inclusive range on the search timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: i64,
    end: i64,
}

impl TimeWindow {
    /// Create a window; `start` must not be after `end`.
    pub fn new(start: i64, end: i64) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window of `span` seconds around `anchor` for the given mode.
    ///
    /// Depart searches look forward from the anchor, arrive searches look back.
    pub fn for_mode(anchor: i64, span: i64, mode: SearchMode) -> Self {
        let span = span.max(0);
        match mode {
            SearchMode::Depart => Self {
                start: anchor,
                end: anchor + span,
            },
            SearchMode::Arrive => Self {
                start: anchor - span,
                end: anchor,
            },
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Returns true if `t` lies inside the window (inclusive).
    pub fn contains(&self, t: i64) -> bool {
        t >= self.start && t <= self.end
    }
}
