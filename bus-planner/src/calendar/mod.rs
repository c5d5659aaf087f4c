//! Service calendar resolution.
//!
//! Answers which service ids run on a date, combining the weekly rules of
//! `calendar.txt` with the per-date exceptions of `calendar_dates.txt`, and
//! classifies dates against the feed's usual pattern.

mod classify;

pub use classify::{BASELINE_DAYS_AFTER, BASELINE_DAYS_BEFORE, DayClassification, DayKind, DayStatus};

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::{CalendarException, CalendarRule, ExceptionKind};

/// The set of service ids active on one date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveServices {
    ids: BTreeSet<String>,
}

impl ActiveServices {
    pub fn new(ids: BTreeSet<String>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if a trip with `trip_service_id` runs under this set.
    ///
    /// Exact ids are tried first, then the prefix before the first `:`
    /// (see [`services_match`]).
    pub fn matches(&self, trip_service_id: &str) -> bool {
        if self.ids.contains(trip_service_id) {
            return true;
        }
        match trip_service_id.split_once(':') {
            Some((prefix, _)) => self.ids.contains(prefix),
            None => false,
        }
    }

    /// Sorted, comma-joined ids. Empty when nothing runs.
    pub fn signature(&self) -> String {
        self.ids
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Returns true if a trip's service id runs under `active_id`.
///
/// Matches exactly, or on the part of the trip's id before its first `:`.
/// Feeds that suffix service ids (`WD:2025`) rely on the prefix form; it can
/// over-match when distinct services share a prefix.
///
/// ```
/// use bus_planner::calendar::services_match;
///
/// assert!(services_match("WD", "WD"));
/// assert!(services_match("WD:2025-spring", "WD"));
/// assert!(!services_match("WD", "WD:2025-spring"));
/// assert!(!services_match("WE", "WD"));
/// ```
pub fn services_match(trip_service_id: &str, active_id: &str) -> bool {
    trip_service_id == active_id
        || trip_service_id
            .split_once(':')
            .is_some_and(|(prefix, _)| prefix == active_id)
}

/// Weekly rules and dated exceptions of one feed version.
#[derive(Debug, Clone, Default)]
pub struct ServiceCalendar {
    rules: Vec<CalendarRule>,
    exceptions: BTreeMap<NaiveDate, Vec<(String, ExceptionKind)>>,
}

impl ServiceCalendar {
    pub fn new(rules: Vec<CalendarRule>, exceptions: Vec<CalendarException>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<(String, ExceptionKind)>> = BTreeMap::new();
        for ex in exceptions {
            by_date
                .entry(ex.date)
                .or_default()
                .push((ex.service_id, ex.kind));
        }
        Self {
            rules,
            exceptions: by_date,
        }
    }

    /// Service ids active on `date`.
    ///
    /// Weekly rules covering the date, minus removals for that date, plus
    /// additions for that date. Additions win over removals.
    pub fn active_services(&self, date: NaiveDate) -> ActiveServices {
        let mut ids: BTreeSet<String> = self
            .rules
            .iter()
            .filter(|rule| rule.runs_on(date))
            .map(|rule| rule.service_id.clone())
            .collect();

        if let Some(exceptions) = self.exceptions.get(&date) {
            for (service_id, kind) in exceptions {
                if *kind == ExceptionKind::Removed {
                    ids.remove(service_id);
                }
            }
            for (service_id, kind) in exceptions {
                if *kind == ExceptionKind::Added {
                    ids.insert(service_id.clone());
                }
            }
        }

        ActiveServices::new(ids)
    }

    /// Returns true if `calendar_dates.txt` has any row for `date`.
    pub fn has_exceptions(&self, date: NaiveDate) -> bool {
        self.exceptions.contains_key(&date)
    }

    /// Classify `date` against the surrounding 90-day pattern.
    pub fn classify(&self, date: NaiveDate) -> DayClassification {
        classify::classify_day(self, date)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn exception_count(&self) -> usize {
        self.exceptions.values().map(Vec::len).sum()
    }
}
