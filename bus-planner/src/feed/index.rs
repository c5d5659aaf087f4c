//! Derived lookup structures over a loaded feed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info, warn};

use crate::calendar::ServiceCalendar;
use crate::domain::{LatLon, Route, Stop, StopTime, Trip, TripSchedule};

use super::Feed;

/// One call of a trip at a stop: the trip and the index into its schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopVisit {
    pub trip_id: String,
    pub position: usize,
}

/// Immutable indices for one feed version.
///
/// Built once by [`FeedIndex::build`] and shared behind an `Arc`. A new feed
/// version gets a new index; this one is never patched.
#[derive(Debug, Default)]
pub struct FeedIndex {
    routes: BTreeMap<String, Route>,
    stops: BTreeMap<String, Stop>,
    trips: BTreeMap<String, Trip>,
    schedules: HashMap<String, TripSchedule>,
    stop_visits: HashMap<String, Vec<StopVisit>>,
    trips_by_route: BTreeMap<String, Vec<String>>,
    grouped_stops: BTreeMap<String, BTreeSet<String>>,
    master_stops: Vec<String>,
    shapes: HashMap<String, Vec<LatLon>>,
    calendar: ServiceCalendar,
}

impl FeedIndex {
    /// Build all indices from parsed feed records.
    ///
    /// - Stops that are neither stations nor quays are skipped.
    /// - Parent references to unknown stops are dropped.
    /// - Trips on unknown routes are skipped.
    /// - Trips whose stop times violate the schedule invariants are skipped.
    pub fn build(feed: Feed) -> Self {
        let Feed {
            stops,
            routes,
            trips,
            stop_times,
            calendars,
            calendar_dates,
            shapes,
        } = feed;

        let stops = index_stops(stops);
        let (grouped_stops, master_stops) = cluster(&stops);

        let routes: BTreeMap<String, Route> =
            routes.into_iter().map(|r| (r.id.clone(), r)).collect();

        let mut trips_by_id = BTreeMap::new();
        let mut unknown_route = 0usize;
        for trip in trips {
            if !routes.contains_key(&trip.route_id) {
                unknown_route += 1;
                continue;
            }
            trips_by_id.insert(trip.id.clone(), trip);
        }
        if unknown_route > 0 {
            warn!(count = unknown_route, "Skipped trips referencing unknown routes");
        }

        let mut grouped_times: HashMap<String, Vec<StopTime>> = HashMap::new();
        let mut orphan_times = 0usize;
        for (trip_id, stop_time) in stop_times {
            if !trips_by_id.contains_key(&trip_id) || !stops.contains_key(&stop_time.stop_id) {
                orphan_times += 1;
                continue;
            }
            grouped_times.entry(trip_id).or_default().push(stop_time);
        }
        if orphan_times > 0 {
            warn!(
                count = orphan_times,
                "Skipped stop times referencing unknown trips or stops"
            );
        }

        let mut schedules = HashMap::with_capacity(grouped_times.len());
        let mut invalid = 0usize;
        for (trip_id, times) in grouped_times {
            match TripSchedule::new(trip_id.clone(), times) {
                Ok(schedule) => {
                    schedules.insert(trip_id, schedule);
                }
                Err(error) => {
                    debug!(%error, "Rejected trip schedule");
                    invalid += 1;
                }
            }
        }
        if invalid > 0 {
            warn!(count = invalid, "Skipped trips with invalid schedules");
        }
        trips_by_id.retain(|id, _| schedules.contains_key(id));

        let mut stop_visits: HashMap<String, Vec<StopVisit>> = HashMap::new();
        for schedule in schedules.values() {
            for (position, st) in schedule.stop_times().iter().enumerate() {
                stop_visits
                    .entry(st.stop_id.clone())
                    .or_default()
                    .push(StopVisit {
                        trip_id: schedule.trip_id().to_string(),
                        position,
                    });
            }
        }
        for visits in stop_visits.values_mut() {
            visits.sort_by(|a, b| a.trip_id.cmp(&b.trip_id).then(a.position.cmp(&b.position)));
        }

        let mut trips_by_route: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for trip in trips_by_id.values() {
            trips_by_route
                .entry(trip.route_id.clone())
                .or_default()
                .push(trip.id.clone());
        }

        let index = Self {
            routes,
            stops,
            trips: trips_by_id,
            schedules,
            stop_visits,
            trips_by_route,
            grouped_stops,
            master_stops,
            shapes: index_shapes(shapes),
            calendar: ServiceCalendar::new(calendars, calendar_dates),
        };

        info!(
            stops = index.stops.len(),
            master_stops = index.master_stops.len(),
            routes = index.routes.len(),
            trips = index.trips.len(),
            shapes = index.shapes.len(),
            "Built feed index"
        );

        index
    }

    /// Returns true if there is nothing to search: no stops or no trips.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty() || self.trips.is_empty()
    }

    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.get(id)
    }

    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn trip(&self, id: &str) -> Option<&Trip> {
        self.trips.get(id)
    }

    pub fn schedule(&self, trip_id: &str) -> Option<&TripSchedule> {
        self.schedules.get(trip_id)
    }

    /// Trip ids calling at a stop, ordered by trip id.
    pub fn visits(&self, stop_id: &str) -> &[StopVisit] {
        self.stop_visits.get(stop_id).map_or(&[], Vec::as_slice)
    }

    /// Trip ids of a route, in ascending order.
    pub fn trips_on_route(&self, route_id: &str) -> &[String] {
        self.trips_by_route.get(route_id).map_or(&[], Vec::as_slice)
    }

    /// Quay ids registered under a parent stop.
    pub fn members(&self, parent_id: &str) -> Option<&BTreeSet<String>> {
        self.grouped_stops.get(parent_id)
    }

    /// Station-level search targets, sorted by id.
    pub fn master_stops(&self) -> &[String] {
        &self.master_stops
    }

    /// Shape points in sequence order.
    pub fn shape(&self, shape_id: &str) -> Option<&[LatLon]> {
        self.shapes.get(shape_id).map(Vec::as_slice)
    }

    pub fn calendar(&self) -> &ServiceCalendar {
        &self.calendar
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }
}

fn index_stops(stops: Vec<Stop>) -> BTreeMap<String, Stop> {
    let mut by_id: BTreeMap<String, Stop> = stops
        .into_iter()
        .filter(|s| s.location_type.is_searchable())
        .map(|s| (s.id.clone(), s))
        .collect();

    let dangling: Vec<String> = by_id
        .values()
        .filter(|s| s.parent_id.as_ref().is_some_and(|p| !by_id.contains_key(p)))
        .map(|s| s.id.clone())
        .collect();

    for id in &dangling {
        if let Some(stop) = by_id.get_mut(id) {
            debug!(stop = %id, parent = ?stop.parent_id, "Dropping unknown parent station");
            stop.parent_id = None;
        }
    }
    if !dangling.is_empty() {
        warn!(count = dangling.len(), "Stops referenced unknown parent stations");
    }

    by_id
}

/// Group quays under their parents and pick the master stops.
fn cluster(stops: &BTreeMap<String, Stop>) -> (BTreeMap<String, BTreeSet<String>>, Vec<String>) {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for stop in stops.values() {
        if let Some(parent) = &stop.parent_id {
            grouped
                .entry(parent.clone())
                .or_default()
                .insert(stop.id.clone());
        }
    }

    let masters = stops
        .values()
        .filter(|s| s.is_station() || (s.parent_id.is_none() && !grouped.contains_key(&s.id)))
        .map(|s| s.id.clone())
        .collect();

    (grouped, masters)
}

fn index_shapes(points: Vec<crate::domain::ShapePoint>) -> HashMap<String, Vec<LatLon>> {
    let mut grouped: HashMap<String, Vec<(u32, LatLon)>> = HashMap::new();
    for p in points {
        grouped
            .entry(p.shape_id)
            .or_default()
            .push((p.sequence, p.location));
    }
    grouped
        .into_iter()
        .map(|(id, mut pts)| {
            pts.sort_by_key(|(seq, _)| *seq);
            (id, pts.into_iter().map(|(_, loc)| loc).collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LocationType, ServiceTime};

    fn stop(id: &str, parent: Option<&str>, kind: LocationType) -> Stop {
        Stop::new(
            id,
            id,
            LatLon::new(45.18, 0.72),
            parent.map(str::to_string),
            kind,
        )
        .unwrap()
    }

    fn st(stop: &str, time: &str, seq: u32) -> StopTime {
        let t = ServiceTime::parse(time).unwrap();
        StopTime::new(stop, t, t, seq)
    }

    fn feed() -> Feed {
        Feed {
            stops: vec![
                stop("GARE", None, LocationType::Station),
                stop("GARE_A", Some("GARE"), LocationType::Quay),
                stop("GARE_B", Some("GARE"), LocationType::Quay),
                stop("LONE", None, LocationType::Quay),
                stop("ORPHAN", Some("NOWHERE"), LocationType::Quay),
                stop("ENTRANCE", Some("GARE"), LocationType::Other(2)),
            ],
            routes: vec![Route::new("A", "1", "", None, None).unwrap()],
            trips: vec![
                Trip::new("T1", "A", "WD", None, None).unwrap(),
                Trip::new("T2", "A", "WD", None, None).unwrap(),
                Trip::new("T3", "Z", "WD", None, None).unwrap(),
            ],
            stop_times: vec![
                ("T1".into(), st("LONE", "08:10:00", 2)),
                ("T1".into(), st("GARE_A", "08:00:00", 1)),
                ("T2".into(), st("GARE_A", "09:00:00", 1)),
                ("T2".into(), st("LONE", "09:10:00", 1)),
                ("T3".into(), st("GARE_A", "09:00:00", 1)),
                ("T3".into(), st("LONE", "09:10:00", 2)),
            ],
            ..Feed::default()
        }
    }

    #[test]
    fn clusters_stations() {
        let index = FeedIndex::build(feed());
        let members = index.members("GARE").unwrap();
        assert_eq!(
            members.iter().map(String::as_str).collect::<Vec<_>>(),
            ["GARE_A", "GARE_B"]
        );
        assert_eq!(index.master_stops(), ["GARE", "LONE", "ORPHAN"]);
    }

    #[test]
    fn drops_dangling_parent_and_non_searchable_stops() {
        let index = FeedIndex::build(feed());
        assert_eq!(index.stop("ORPHAN").unwrap().parent_id, None);
        assert!(index.stop("ENTRANCE").is_none());
    }

    #[test]
    fn rejects_invalid_trips() {
        let index = FeedIndex::build(feed());
        // T2 has a duplicate sequence, T3 an unknown route
        assert!(index.trip("T1").is_some());
        assert!(index.trip("T2").is_none());
        assert!(index.trip("T3").is_none());
        assert_eq!(index.trips_on_route("A"), ["T1"]);
    }

    #[test]
    fn schedules_sorted_and_visits_indexed() {
        let index = FeedIndex::build(feed());
        let schedule = index.schedule("T1").unwrap();
        assert_eq!(schedule.stop_times()[0].stop_id, "GARE_A");

        let visits = index.visits("LONE");
        assert_eq!(
            visits,
            [StopVisit {
                trip_id: "T1".into(),
                position: 1
            }]
        );
        assert!(index.visits("GARE_B").is_empty());
    }

    #[test]
    fn empty_feed_is_empty() {
        assert!(FeedIndex::build(Feed::default()).is_empty());
        assert!(!FeedIndex::build(feed()).is_empty());
    }

    #[test]
    fn shapes_sorted_by_sequence() {
        let mut f = feed();
        f.shapes = vec![
            crate::domain::ShapePoint {
                shape_id: "SH".into(),
                sequence: 2,
                location: LatLon::new(1.0, 1.0),
            },
            crate::domain::ShapePoint {
                shape_id: "SH".into(),
                sequence: 1,
                location: LatLon::new(0.0, 0.0),
            },
        ];
        let index = FeedIndex::build(f);
        assert_eq!(index.shape("SH").unwrap()[0], LatLon::new(0.0, 0.0));
    }
}
