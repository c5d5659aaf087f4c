//! Ordering of search results.
//!
//! Depart-at searches want the earliest departure first; arrive-by searches
//! want the latest arrival that still makes it, so results are ordered from
//! the requested time outwards in both modes.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::SearchMode;

use super::direct::DirectTrip;
use super::transfer::TransferCandidate;

fn by_mode(mode: SearchMode, departure: (i64, i64), arrival: (i64, i64)) -> Ordering {
    match mode {
        // Primary: departure ascending, then arrival ascending
        SearchMode::Depart => departure
            .0
            .cmp(&departure.1)
            .then(arrival.0.cmp(&arrival.1)),
        // Primary: arrival descending, then departure descending
        SearchMode::Arrive => arrival
            .1
            .cmp(&arrival.0)
            .then(departure.1.cmp(&departure.0)),
    }
}

/// Sort single-trip results for `mode`.
pub fn sort_direct(trips: &mut [DirectTrip], mode: SearchMode) {
    trips.sort_by(|a, b| {
        by_mode(mode, (a.departure, b.departure), (a.arrival, b.arrival))
            .then_with(|| a.trip_id.cmp(&b.trip_id))
    });
}

/// Sort transfer results by first-leg departure or second-leg arrival.
pub fn sort_transfers(candidates: &mut [TransferCandidate], mode: SearchMode) {
    candidates.sort_by(|a, b| {
        by_mode(
            mode,
            (a.first.departure, b.first.departure),
            (a.second.arrival, b.second.arrival),
        )
        .then_with(|| a.first.trip_id.cmp(&b.first.trip_id))
        .then_with(|| a.second.trip_id.cmp(&b.second.trip_id))
    });
}

/// Keep the first candidate for each (first trip, second trip) pair.
///
/// The same pair of trips can be found through several hubs.
pub fn deduplicate(candidates: Vec<TransferCandidate>) -> Vec<TransferCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert((c.first.trip_id.clone(), c.second.trip_id.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::transfer::Hub;

    fn trip(id: &str, departure: i64, arrival: i64) -> DirectTrip {
        DirectTrip {
            trip_id: id.to_string(),
            route_id: "R".into(),
            service_id: "WD".into(),
            board_stop_id: "A".into(),
            alight_stop_id: "B".into(),
            board_idx: 0,
            alight_idx: 1,
            departure,
            arrival,
            day_offset: 0,
        }
    }

    fn candidate(first: DirectTrip, second: DirectTrip) -> TransferCandidate {
        TransferCandidate {
            hub: Hub::shared("R1", "R2", "H"),
            first,
            second,
        }
    }

    fn ids(trips: &[DirectTrip]) -> Vec<&str> {
        trips.iter().map(|t| t.trip_id.as_str()).collect()
    }

    #[test]
    fn depart_mode_earliest_departure_first() {
        let mut trips = vec![trip("B", 600, 900), trip("A", 300, 1_200), trip("C", 300, 800)];
        sort_direct(&mut trips, SearchMode::Depart);
        assert_eq!(ids(&trips), ["C", "A", "B"]);
    }

    #[test]
    fn arrive_mode_latest_arrival_first() {
        let mut trips = vec![trip("A", 100, 800), trip("B", 200, 1_000), trip("C", 300, 900)];
        sort_direct(&mut trips, SearchMode::Arrive);
        assert_eq!(ids(&trips), ["B", "C", "A"]);
    }

    #[test]
    fn transfers_sorted_and_deduplicated() {
        let mut candidates = vec![
            candidate(trip("F2", 500, 600), trip("S1", 900, 1_500)),
            candidate(trip("F1", 400, 500), trip("S1", 900, 1_500)),
            candidate(trip("F1", 400, 500), trip("S1", 900, 1_500)),
        ];
        sort_transfers(&mut candidates, SearchMode::Depart);
        let candidates = deduplicate(candidates);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].first.trip_id, "F1");
    }

    #[test]
    fn transfers_arrive_mode() {
        let mut candidates = vec![
            candidate(trip("F1", 400, 500), trip("S1", 900, 1_500)),
            candidate(trip("F2", 300, 400), trip("S2", 800, 1_700)),
        ];
        sort_transfers(&mut candidates, SearchMode::Arrive);
        assert_eq!(candidates[0].second.trip_id, "S2");
    }
}
