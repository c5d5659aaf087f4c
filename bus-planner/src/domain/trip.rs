//! Trips and their validated stop-time schedules.

use std::collections::BTreeSet;

use super::{DomainError, ServiceTime};

/// A trip from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub shape_id: Option<String>,
    pub headsign: Option<String>,
}

impl Trip {
    pub fn new(
        id: impl Into<String>,
        route_id: impl Into<String>,
        service_id: impl Into<String>,
        shape_id: Option<String>,
        headsign: Option<String>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyId("trip"));
        }
        Ok(Self {
            id,
            route_id: route_id.into(),
            service_id: service_id.into(),
            shape_id: shape_id.filter(|s| !s.is_empty()),
            headsign: headsign.filter(|s| !s.is_empty()),
        })
    }
}

/// One timetabled call of a trip at a stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    pub stop_id: String,
    pub arrival: ServiceTime,
    pub departure: ServiceTime,
    pub sequence: u32,
}

impl StopTime {
    pub fn new(
        stop_id: impl Into<String>,
        arrival: ServiceTime,
        departure: ServiceTime,
        sequence: u32,
    ) -> Self {
        Self {
            stop_id: stop_id.into(),
            arrival,
            departure,
            sequence,
        }
    }
}

/// The ordered stop times of one trip.
///
/// # Invariants
///
/// - At least two stop times
/// - Sequence numbers strictly increasing
///
/// Any `TripSchedule` value satisfies these, so boarding and alighting
/// indices found on it are always ordered along the trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSchedule {
    trip_id: String,
    stop_times: Vec<StopTime>,
}

impl TripSchedule {
    /// Build a schedule, sorting by sequence and validating invariants.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than two stop times are given, or if two stop
    /// times share a sequence number.
    ///
    /// # Examples
    ///
    /// ```
    /// use bus_planner::domain::{ServiceTime, StopTime, TripSchedule};
    ///
    /// let t = |s: &str| ServiceTime::parse(s).unwrap();
    /// let schedule = TripSchedule::new(
    ///     "T1",
    ///     vec![
    ///         StopTime::new("S2", t("08:32:00"), t("08:32:00"), 7),
    ///         StopTime::new("S1", t("08:15:00"), t("08:15:00"), 3),
    ///     ],
    /// )
    /// .unwrap();
    /// assert_eq!(schedule.stop_times()[0].stop_id, "S1");
    ///
    /// let duplicate = TripSchedule::new(
    ///     "T2",
    ///     vec![
    ///         StopTime::new("S1", t("08:15:00"), t("08:15:00"), 3),
    ///         StopTime::new("S2", t("08:32:00"), t("08:32:00"), 3),
    ///     ],
    /// );
    /// assert!(duplicate.is_err());
    /// ```
    pub fn new(
        trip_id: impl Into<String>,
        mut stop_times: Vec<StopTime>,
    ) -> Result<Self, DomainError> {
        let trip_id = trip_id.into();
        if stop_times.len() < 2 {
            return Err(DomainError::TooFewStopTimes {
                trip_id,
                count: stop_times.len(),
            });
        }

        stop_times.sort_by_key(|st| st.sequence);

        for pair in stop_times.windows(2) {
            if pair[1].sequence <= pair[0].sequence {
                return Err(DomainError::NonMonotonicSequence {
                    trip_id,
                    previous: pair[0].sequence,
                    current: pair[1].sequence,
                });
            }
        }

        Ok(Self {
            trip_id,
            stop_times,
        })
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    pub fn stop_times(&self) -> &[StopTime] {
        &self.stop_times
    }

    pub fn len(&self) -> usize {
        self.stop_times.len()
    }

    /// Always false: a schedule holds at least two stop times.
    pub fn is_empty(&self) -> bool {
        self.stop_times.is_empty()
    }

    /// Index of the first stop time at or after `from` whose stop is in `stops`.
    pub fn position_from(&self, stops: &BTreeSet<String>, from: usize) -> Option<usize> {
        self.stop_times
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, st)| stops.contains(&st.stop_id))
            .map(|(idx, _)| idx)
    }

    /// Scan once for the first stop time in `board` and the first in `alight`.
    ///
    /// Returns the pair only when boarding strictly precedes alighting.
    pub fn board_alight(
        &self,
        board: &BTreeSet<String>,
        alight: &BTreeSet<String>,
    ) -> Option<(usize, usize)> {
        let mut board_idx = None;
        let mut alight_idx = None;

        for (idx, st) in self.stop_times.iter().enumerate() {
            if board_idx.is_none() && board.contains(&st.stop_id) {
                board_idx = Some(idx);
            }
            if alight_idx.is_none() && alight.contains(&st.stop_id) {
                alight_idx = Some(idx);
            }
            if board_idx.is_some() && alight_idx.is_some() {
                break;
            }
        }

        match (board_idx, alight_idx) {
            (Some(b), Some(a)) if b < a => Some((b, a)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ServiceTime {
        ServiceTime::parse(s).unwrap()
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn schedule(stops: &[(&str, &str)]) -> TripSchedule {
        let stop_times = stops
            .iter()
            .enumerate()
            .map(|(i, (stop, time))| StopTime::new(*stop, t(time), t(time), i as u32 + 1))
            .collect();
        TripSchedule::new("T", stop_times).unwrap()
    }

    #[test]
    fn rejects_single_stop() {
        let err = TripSchedule::new("T", vec![StopTime::new("S1", t("08:00"), t("08:00"), 1)]);
        assert!(matches!(err, Err(DomainError::TooFewStopTimes { count: 1, .. })));
    }

    #[test]
    fn sorts_by_sequence() {
        let s = TripSchedule::new(
            "T",
            vec![
                StopTime::new("C", t("08:20"), t("08:20"), 30),
                StopTime::new("A", t("08:00"), t("08:00"), 10),
                StopTime::new("B", t("08:10"), t("08:10"), 20),
            ],
        )
        .unwrap();
        let order: Vec<_> = s.stop_times().iter().map(|st| st.stop_id.as_str()).collect();
        assert_eq!(order, ["A", "B", "C"]);
    }

    #[test]
    fn board_alight_forward_only() {
        let s = schedule(&[("A", "08:00"), ("B", "08:10"), ("C", "08:20")]);
        assert_eq!(s.board_alight(&set(&["A"]), &set(&["C"])), Some((0, 2)));
        assert_eq!(s.board_alight(&set(&["C"]), &set(&["A"])), None);
        assert_eq!(s.board_alight(&set(&["A"]), &set(&["X"])), None);
    }

    #[test]
    fn board_alight_uses_first_matches() {
        // Loop: A B A C — the first A boards, C alights
        let s = schedule(&[("A", "08:00"), ("B", "08:10"), ("A", "08:20"), ("C", "08:30")]);
        assert_eq!(s.board_alight(&set(&["A"]), &set(&["C"])), Some((0, 3)));
        // First B precedes second A, so the reverse direction is rejected
        assert_eq!(s.board_alight(&set(&["B"]), &set(&["A"])), None);
    }

    #[test]
    fn positions() {
        let s = schedule(&[("A", "08:00"), ("B", "08:10"), ("A", "08:20")]);
        assert_eq!(s.position_from(&set(&["B", "A"]), 1), Some(1));
        assert_eq!(s.position_from(&set(&["Z"]), 0), None);
    }
}
