//! Single-trip connections between two stop sets.
//!
//! Stop times are relative to their service day, so a search first builds
//! the day contexts that can contribute to the requested window: the
//! previous day for trips still running after midnight, the requested day,
//! and the next day when the window runs past midnight. Each context shifts
//! times onto the requested date's timeline.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use tracing::{debug, trace};

use crate::calendar::ActiveServices;
use crate::domain::{DAY_SECS, SearchMode, TimeWindow};
use crate::feed::FeedIndex;

use super::rank::sort_direct;

/// One service day placed on the requested date's timeline.
#[derive(Debug, Clone)]
pub struct DayContext {
    pub date: NaiveDate,
    /// Seconds added to the day's stop times.
    pub offset: i64,
    pub active: ActiveServices,
}

/// Contexts that can contribute to `window`, in previous/requested/next order.
///
/// The previous day is only consulted for windows starting before
/// `early_cutoff` seconds; the next day only for windows ending after
/// midnight.
pub fn day_contexts(
    index: &FeedIndex,
    date: NaiveDate,
    window: &TimeWindow,
    early_cutoff: i64,
) -> Vec<DayContext> {
    let calendar = index.calendar();
    let mut contexts = Vec::with_capacity(3);

    if window.start() < early_cutoff {
        let previous = date - Duration::days(1);
        contexts.push(DayContext {
            date: previous,
            offset: -DAY_SECS,
            active: calendar.active_services(previous),
        });
    }

    contexts.push(DayContext {
        date,
        offset: 0,
        active: calendar.active_services(date),
    });

    if window.end() > DAY_SECS {
        let next = date + Duration::days(1);
        contexts.push(DayContext {
            date: next,
            offset: DAY_SECS,
            active: calendar.active_services(next),
        });
    }

    trace!(%date, contexts = contexts.len(), "Built day contexts");
    contexts
}

/// A ride on one trip from a boarding stop to an alighting stop.
///
/// Times are on the requested date's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectTrip {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub board_stop_id: String,
    pub alight_stop_id: String,
    pub board_idx: usize,
    pub alight_idx: usize,
    pub departure: i64,
    pub arrival: i64,
    /// `-86400`, `0` or `86400`: which service day the trip ran under.
    pub day_offset: i64,
}

impl DirectTrip {
    pub fn duration_secs(&self) -> i64 {
        self.arrival - self.departure
    }
}

/// Place one trip between `board` and `alight`.
///
/// Tries the contexts in order and returns the first whose services include
/// the trip and whose shifted times pass `accept(departure, arrival)`.
pub fn match_trip(
    index: &FeedIndex,
    trip_id: &str,
    board: &BTreeSet<String>,
    alight: &BTreeSet<String>,
    contexts: &[DayContext],
    accept: impl Fn(i64, i64) -> bool,
) -> Option<DirectTrip> {
    let trip = index.trip(trip_id)?;
    let schedule = index.schedule(trip_id)?;
    let (board_idx, alight_idx) = schedule.board_alight(board, alight)?;
    let board_call = &schedule.stop_times()[board_idx];
    let alight_call = &schedule.stop_times()[alight_idx];

    contexts
        .iter()
        .filter(|ctx| ctx.active.matches(&trip.service_id))
        .find_map(|ctx| {
            let departure = board_call.departure.on_timeline(ctx.offset);
            let arrival = alight_call.arrival.on_timeline(ctx.offset);
            accept(departure, arrival).then(|| DirectTrip {
                trip_id: trip.id.clone(),
                route_id: trip.route_id.clone(),
                service_id: trip.service_id.clone(),
                board_stop_id: board_call.stop_id.clone(),
                alight_stop_id: alight_call.stop_id.clone(),
                board_idx,
                alight_idx,
                departure,
                arrival,
                day_offset: ctx.offset,
            })
        })
}

/// Trips calling at any stop of `stops`, ordered by id.
pub fn trips_serving(index: &FeedIndex, stops: &BTreeSet<String>) -> BTreeSet<String> {
    stops
        .iter()
        .flat_map(|stop| index.visits(stop))
        .map(|visit| visit.trip_id.clone())
        .collect()
}

/// All single-trip rides from `start` to `end` whose departure (depart mode)
/// or arrival (arrive mode) falls in `window`.
///
/// Both sets must already be expanded to boardable quays.
pub fn find_direct_trips(
    index: &FeedIndex,
    start: &BTreeSet<String>,
    end: &BTreeSet<String>,
    contexts: &[DayContext],
    window: &TimeWindow,
    mode: SearchMode,
) -> Vec<DirectTrip> {
    let candidates = trips_serving(index, start);

    let mut found: Vec<DirectTrip> = candidates
        .iter()
        .filter_map(|trip_id| {
            match_trip(index, trip_id, start, end, contexts, |dep, arr| {
                let anchor = match mode {
                    SearchMode::Depart => dep,
                    SearchMode::Arrive => arr,
                };
                window.contains(anchor)
            })
        })
        .collect();

    sort_direct(&mut found, mode);

    debug!(
        candidates = candidates.len(),
        found = found.len(),
        ?mode,
        "Direct trip search"
    );

    found
}
