//! Schedule-day classification.
//!
//! A date is compared with the most common service signature of its day kind
//! (weekday or weekend) over a window around it. Days carrying dated
//! exceptions are left out of the baseline so holidays do not skew it.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use tracing::trace;

use super::ServiceCalendar;

/// Days before the requested date included in the baseline window.
pub const BASELINE_DAYS_BEFORE: i64 = 45;

/// Days after the requested date included in the baseline window.
pub const BASELINE_DAYS_AFTER: i64 = 44;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayKind {
    Weekday,
    Weekend,
}

impl DayKind {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayStatus {
    /// Runs the usual services for its day kind.
    Standard,
    /// Has dated exceptions or an unusual set of services.
    Adapted,
    /// Nothing runs.
    NoService,
}

/// Result of [`ServiceCalendar::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayClassification {
    pub date: NaiveDate,
    pub kind: DayKind,
    pub status: DayStatus,
    /// A standard day next to an irregular one.
    pub transition: bool,
    pub signature: String,
    pub baseline: Option<String>,
    pub has_exceptions: bool,
}

#[derive(Debug, Default)]
struct Baselines {
    weekday: Option<String>,
    weekend: Option<String>,
}

impl Baselines {
    fn for_kind(&self, kind: DayKind) -> Option<&str> {
        match kind {
            DayKind::Weekday => self.weekday.as_deref(),
            DayKind::Weekend => self.weekend.as_deref(),
        }
    }
}

fn compute_baselines(calendar: &ServiceCalendar, date: NaiveDate) -> Baselines {
    let mut weekday: BTreeMap<String, usize> = BTreeMap::new();
    let mut weekend: BTreeMap<String, usize> = BTreeMap::new();

    for offset in -BASELINE_DAYS_BEFORE..=BASELINE_DAYS_AFTER {
        let day = date + Duration::days(offset);
        if calendar.has_exceptions(day) {
            continue;
        }
        let signature = calendar.active_services(day).signature();
        if signature.is_empty() {
            continue;
        }
        let tally = match DayKind::of(day) {
            DayKind::Weekday => &mut weekday,
            DayKind::Weekend => &mut weekend,
        };
        *tally.entry(signature).or_default() += 1;
    }

    Baselines {
        weekday: mode(weekday),
        weekend: mode(weekend),
    }
}

/// Most frequent signature; ties go to the smallest one.
fn mode(tally: BTreeMap<String, usize>) -> Option<String> {
    let mut best: Option<(String, usize)> = None;
    // BTreeMap iterates in ascending key order, so `>` keeps the smallest on ties
    for (signature, count) in tally {
        if best.as_ref().is_none_or(|(_, c)| count > *c) {
            best = Some((signature, count));
        }
    }
    best.map(|(signature, _)| signature)
}

fn is_irregular(calendar: &ServiceCalendar, baselines: &Baselines, day: NaiveDate) -> bool {
    if calendar.has_exceptions(day) {
        return true;
    }
    let signature = calendar.active_services(day).signature();
    let baseline = baselines.for_kind(DayKind::of(day));
    if signature.is_empty() {
        // Service stopping counts only when the day kind normally has some
        return baseline.is_some();
    }
    baseline != Some(signature.as_str())
}

pub(super) fn classify_day(calendar: &ServiceCalendar, date: NaiveDate) -> DayClassification {
    let baselines = compute_baselines(calendar, date);
    let kind = DayKind::of(date);
    let signature = calendar.active_services(date).signature();
    let has_exceptions = calendar.has_exceptions(date);
    let baseline = baselines.for_kind(kind).map(str::to_string);

    let status = if signature.is_empty() {
        DayStatus::NoService
    } else if has_exceptions || baseline.as_deref() != Some(signature.as_str()) {
        DayStatus::Adapted
    } else {
        DayStatus::Standard
    };

    let transition = status == DayStatus::Standard
        && [date - Duration::days(1), date + Duration::days(1)]
            .into_iter()
            .any(|day| is_irregular(calendar, &baselines, day));

    trace!(%date, ?status, transition, %signature, "Classified day");

    DayClassification {
        date,
        kind,
        status,
        transition,
        signature,
        baseline,
        has_exceptions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::tests::{WEEKDAYS, WEEKENDS, date, rule};
    use crate::domain::{CalendarException, CalendarRule, ExceptionKind};

    fn removed(id: &str, d: NaiveDate) -> CalendarException {
        CalendarException {
            service_id: id.to_string(),
            date: d,
            kind: ExceptionKind::Removed,
        }
    }

    fn calendar(exceptions: Vec<CalendarException>) -> ServiceCalendar {
        ServiceCalendar::new(vec![rule("WD", WEEKDAYS), rule("WE", WEEKENDS)], exceptions)
    }

    #[test]
    fn regular_weekday_is_standard() {
        let c = calendar(vec![]).classify(date(2025, 3, 12));
        assert_eq!(c.kind, DayKind::Weekday);
        assert_eq!(c.status, DayStatus::Standard);
        assert_eq!(c.baseline.as_deref(), Some("WD"));
        assert!(!c.transition);
    }

    #[test]
    fn exception_day_is_adapted() {
        let holiday = date(2025, 5, 1);
        let cal = ServiceCalendar::new(
            vec![rule("WD", WEEKDAYS), rule("WE", WEEKENDS)],
            vec![
                removed("WD", holiday),
                CalendarException {
                    service_id: "WE".to_string(),
                    date: holiday,
                    kind: ExceptionKind::Added,
                },
            ],
        );
        let c = cal.classify(holiday);
        assert_eq!(c.status, DayStatus::Adapted);
        assert!(c.has_exceptions);
        assert_eq!(c.signature, "WE");
    }

    #[test]
    fn empty_day_is_no_service() {
        let holiday = date(2025, 5, 1);
        let c = calendar(vec![removed("WD", holiday)]).classify(holiday);
        assert_eq!(c.status, DayStatus::NoService);
        assert!(!c.transition);
    }

    #[test]
    fn neighbour_of_holiday_is_transition() {
        let holiday = date(2025, 5, 1); // Thursday
        let cal = calendar(vec![removed("WD", holiday)]);

        let friday = cal.classify(date(2025, 5, 2));
        assert_eq!(friday.status, DayStatus::Standard);
        assert!(friday.transition);

        let tuesday = cal.classify(date(2025, 4, 29));
        assert!(!tuesday.transition);
    }

    #[test]
    fn last_day_before_calendar_end_is_transition() {
        let ending = CalendarRule {
            end_date: date(2025, 3, 12),
            ..rule("WD", WEEKDAYS)
        };
        let cal = ServiceCalendar::new(vec![ending], vec![]);

        // Wednesday: service stops on Thursday
        let last = cal.classify(date(2025, 3, 12));
        assert_eq!(last.status, DayStatus::Standard);
        assert!(last.transition);

        // Monday: Sunday never has service, so it is no change
        let monday = cal.classify(date(2025, 3, 10));
        assert_eq!(monday.status, DayStatus::Standard);
        assert!(!monday.transition);

        let after = cal.classify(date(2025, 3, 13));
        assert_eq!(after.status, DayStatus::NoService);
        assert!(!after.transition);
    }

    #[test]
    fn mode_prefers_smallest_on_tie() {
        let tally = BTreeMap::from([("B".to_string(), 3), ("A".to_string(), 3), ("C".to_string(), 1)]);
        assert_eq!(mode(tally).as_deref(), Some("A"));
        assert_eq!(mode(BTreeMap::new()), None);
    }

    #[test]
    fn day_kind() {
        assert_eq!(DayKind::of(date(2025, 3, 15)), DayKind::Weekend);
        assert_eq!(DayKind::of(date(2025, 3, 14)), DayKind::Weekday);
    }
}
