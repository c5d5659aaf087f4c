//! One-transfer connections through hub stops.
//!
//! Hub discovery looks at every route leaving the start set and every route
//! reaching the end set. A stop served after boarding on one and before
//! alighting on another is a shared hub. When there is none, nearby stop
//! pairs on the two routes become walking hubs.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::domain::{SearchMode, TimeWindow};
use crate::feed::FeedIndex;

use super::SearchError;
use super::cancel::CancelToken;
use super::config::SearchConfig;
use super::direct::{DayContext, DirectTrip, match_trip, trips_serving};
use super::rank::{deduplicate, sort_transfers};

/// Where a rider changes from the origin route to the destination route.
#[derive(Debug, Clone, PartialEq)]
pub struct Hub {
    pub origin_route: String,
    pub destination_route: String,
    /// Stop where the first leg ends.
    pub alight_stop: String,
    /// Stop where the second leg starts; the same stop for shared hubs.
    pub board_stop: String,
    pub walk_m: f64,
    pub walk_secs: i64,
}

impl Hub {
    pub fn shared(origin_route: &str, destination_route: &str, stop: &str) -> Self {
        Self {
            origin_route: origin_route.to_string(),
            destination_route: destination_route.to_string(),
            alight_stop: stop.to_string(),
            board_stop: stop.to_string(),
            walk_m: 0.0,
            walk_secs: 0,
        }
    }

    pub fn is_pair(&self) -> bool {
        self.alight_stop != self.board_stop
    }
}

/// Two rides joined at a hub.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferCandidate {
    pub hub: Hub,
    pub first: DirectTrip,
    pub second: DirectTrip,
}

impl TransferCandidate {
    /// Time between the first arrival and the second departure.
    pub fn connection_secs(&self) -> i64 {
        self.second.departure - self.first.arrival
    }
}

/// Stops reachable after boarding in `start`, per route.
fn routes_after(index: &FeedIndex, start: &BTreeSet<String>) -> BTreeMap<String, BTreeSet<String>> {
    let mut after: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for trip_id in trips_serving(index, start) {
        let (Some(trip), Some(schedule)) = (index.trip(&trip_id), index.schedule(&trip_id)) else {
            continue;
        };
        let Some(board) = schedule.position_from(start, 0) else {
            continue;
        };
        let stops = after.entry(trip.route_id.clone()).or_default();
        for st in &schedule.stop_times()[board + 1..] {
            stops.insert(st.stop_id.clone());
        }
    }
    after
}

/// Stops from which `end` can still be reached, per route.
fn routes_before(index: &FeedIndex, end: &BTreeSet<String>) -> BTreeMap<String, BTreeSet<String>> {
    let mut before: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for trip_id in trips_serving(index, end) {
        let (Some(trip), Some(schedule)) = (index.trip(&trip_id), index.schedule(&trip_id)) else {
            continue;
        };
        let Some(alight) = schedule.position_from(end, 1) else {
            continue;
        };
        let stops = before.entry(trip.route_id.clone()).or_default();
        for st in &schedule.stop_times()[..alight] {
            stops.insert(st.stop_id.clone());
        }
    }
    before
}

/// Candidate hubs between the start and end sets.
///
/// Shared hubs come in discovery order: origin route id, then stop id, then
/// destination route id. Pair hubs are used only when no shared hub exists
/// and are ordered by walking distance.
pub fn find_hubs(
    index: &FeedIndex,
    start: &BTreeSet<String>,
    end: &BTreeSet<String>,
    config: &SearchConfig,
) -> Vec<Hub> {
    let excluded = |stop: &String| start.contains(stop) || end.contains(stop);

    let mut after = routes_after(index, start);
    let mut before = routes_before(index, end);
    for stops in after.values_mut().chain(before.values_mut()) {
        stops.retain(|s| !excluded(s));
    }

    let mut hubs = Vec::new();
    for (origin_route, origin_stops) in &after {
        for stop in origin_stops {
            for (destination_route, destination_stops) in &before {
                if destination_route != origin_route && destination_stops.contains(stop) {
                    hubs.push(Hub::shared(origin_route, destination_route, stop));
                }
            }
        }
    }

    if hubs.is_empty() {
        hubs = pair_hubs(index, &after, &before, config);
    }

    debug!(
        origin_routes = after.len(),
        destination_routes = before.len(),
        hubs = hubs.len(),
        pairs = hubs.iter().any(Hub::is_pair),
        "Discovered transfer hubs"
    );

    hubs
}

fn pair_hubs(
    index: &FeedIndex,
    after: &BTreeMap<String, BTreeSet<String>>,
    before: &BTreeMap<String, BTreeSet<String>>,
    config: &SearchConfig,
) -> Vec<Hub> {
    let mut pairs = Vec::new();
    for (origin_route, origin_stops) in after {
        for (destination_route, destination_stops) in before {
            if destination_route == origin_route {
                continue;
            }
            for from in origin_stops.iter().filter_map(|id| index.stop(id)) {
                for to in destination_stops.iter().filter_map(|id| index.stop(id)) {
                    if from.id == to.id {
                        continue;
                    }
                    let walk_m = from.location.distance_m(&to.location);
                    if walk_m <= config.hub_walk_radius_m {
                        pairs.push(Hub {
                            origin_route: origin_route.clone(),
                            destination_route: destination_route.clone(),
                            alight_stop: from.id.clone(),
                            board_stop: to.id.clone(),
                            walk_m,
                            walk_secs: config.walk_secs(walk_m),
                        });
                    }
                }
            }
        }
    }

    // Stable: equal distances keep discovery order
    pairs.sort_by(|a, b| a.walk_m.partial_cmp(&b.walk_m).unwrap_or(Ordering::Equal));
    pairs
}

/// Everything [`find_transfers`] needs to know about one search.
#[derive(Debug, Clone, Copy)]
pub struct TransferQuery<'q> {
    pub start: &'q BTreeSet<String>,
    pub end: &'q BTreeSet<String>,
    pub contexts: &'q [DayContext],
    pub window: &'q TimeWindow,
    pub mode: SearchMode,
}

/// Two-trip connections through `hubs`, sorted and capped at `max_results`.
///
/// Stops after `max_hubs` hubs with a usable first leg; hubs whose origin
/// route does not run in the window are not counted. Checks `cancel` before
/// each hub and each first-leg trip.
pub fn find_transfers(
    index: &FeedIndex,
    hubs: &[Hub],
    query: TransferQuery<'_>,
    config: &SearchConfig,
    cancel: &CancelToken,
) -> Result<Vec<TransferCandidate>, SearchError> {
    let mut candidates = Vec::new();
    let mut live_hubs = 0usize;

    for hub in hubs {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        if live_hubs >= config.max_hubs {
            debug!(live_hubs, "Hub limit reached");
            break;
        }
        let mut live = false;

        let hub_alight = BTreeSet::from([hub.alight_stop.clone()]);
        let hub_board = BTreeSet::from([hub.board_stop.clone()]);

        for first_id in index.trips_on_route(&hub.origin_route) {
            if cancel.is_cancelled() {
                return Err(SearchError::Cancelled);
            }

            let Some(first) = match_trip(
                index,
                first_id,
                query.start,
                &hub_alight,
                query.contexts,
                |dep, _| query.window.contains(dep),
            ) else {
                continue;
            };
            live = true;

            let earliest = first.arrival + config.min_transfer_secs + hub.walk_secs;
            let latest = first.arrival + config.max_transfer_secs;

            for second_id in index.trips_on_route(&hub.destination_route) {
                let second = match_trip(
                    index,
                    second_id,
                    &hub_board,
                    query.end,
                    query.contexts,
                    |dep, arr| {
                        dep >= earliest
                            && dep <= latest
                            && (query.mode == SearchMode::Depart || arr <= query.window.end())
                    },
                );
                if let Some(second) = second {
                    trace!(
                        first = %first.trip_id,
                        second = %second.trip_id,
                        hub = %hub.alight_stop,
                        "Transfer candidate"
                    );
                    candidates.push(TransferCandidate {
                        hub: hub.clone(),
                        first: first.clone(),
                        second,
                    });
                }
            }
        }
        if live {
            live_hubs += 1;
        }
    }

    let mut candidates = deduplicate(candidates);
    sort_transfers(&mut candidates, query.mode);
    candidates.truncate(config.max_results);
    Ok(candidates)
}
