//! Turning search candidates into door-to-door itineraries.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::domain::{LatLon, format_clock};
use crate::feed::FeedIndex;
use crate::places::PlaceResolver;
use crate::planner::{Candidate, DirectTrip};
use crate::walking::{WalkRoute, WalkingProvider};

use super::geometry::{clip_shape, polyline_length_m};
use super::types::{BusLeg, IntermediateStop, Itinerary, Leg, WaitLeg, WalkLeg};

/// Configuration for itinerary assembly.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Walks longer than this (straight-line metres) go to the walking router.
    pub walk_provider_threshold_m: f64,

    /// Speed for synthesized walks (metres per second).
    pub walking_speed_mps: f64,

    /// Shortest duration given to a synthesized walk (seconds).
    pub min_walk_secs: f64,

    /// Walks shorter than this (metres) are left out.
    pub min_walk_leg_m: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            walk_provider_threshold_m: 100.0,
            walking_speed_mps: 1.35,
            min_walk_secs: 30.0,
            min_walk_leg_m: 1.0,
        }
    }
}

/// Builds itineraries for one feed version.
pub struct Assembler<'a, W: WalkingProvider, P: PlaceResolver> {
    index: &'a FeedIndex,
    walker: &'a W,
    places: &'a P,
    config: &'a AssemblerConfig,
}

/// Walks of one itinerary: approach, transfer, egress.
type Walks = (Option<WalkLeg>, Option<WalkLeg>, Option<WalkLeg>);

impl<'a, W: WalkingProvider, P: PlaceResolver> Assembler<'a, W, P> {
    pub fn new(
        index: &'a FeedIndex,
        walker: &'a W,
        places: &'a P,
        config: &'a AssemblerConfig,
    ) -> Self {
        Self {
            index,
            walker,
            places,
            config,
        }
    }

    /// Assemble one itinerary, resolving endpoint labels alongside the walks.
    pub async fn assemble(
        &self,
        origin: LatLon,
        destination: LatLon,
        candidate: &Candidate,
    ) -> Itinerary {
        let (origin_label, destination_label, itinerary) = futures::join!(
            self.places.resolve(origin),
            self.places.resolve(destination),
            self.build(origin, destination, candidate),
        );
        Itinerary {
            origin_label,
            destination_label,
            ..itinerary
        }
    }

    /// Assemble every candidate, keeping their order.
    ///
    /// Endpoint labels are resolved once and shared by all itineraries.
    pub async fn assemble_all(
        &self,
        origin: LatLon,
        destination: LatLon,
        candidates: &[Candidate],
    ) -> Vec<Itinerary> {
        let (origin_label, destination_label, itineraries) = futures::join!(
            self.places.resolve(origin),
            self.places.resolve(destination),
            join_all(
                candidates
                    .iter()
                    .map(|candidate| self.build(origin, destination, candidate))
            ),
        );

        itineraries
            .into_iter()
            .map(|itinerary| Itinerary {
                origin_label: origin_label.clone(),
                destination_label: destination_label.clone(),
                ..itinerary
            })
            .collect()
    }

    async fn build(&self, origin: LatLon, destination: LatLon, candidate: &Candidate) -> Itinerary {
        let (first, second) = match candidate {
            Candidate::Direct(trip) => (trip, None),
            Candidate::Transfer(t) => (&t.first, Some(&t.second)),
        };
        let last = second.unwrap_or(first);

        let board = self.stop_location(&first.board_stop_id, origin);
        let alight = self.stop_location(&last.alight_stop_id, destination);
        let transfer_ends = second.map(|second| {
            (
                self.stop_location(&first.alight_stop_id, alight),
                self.stop_location(&second.board_stop_id, alight),
            )
        });

        let (approach, transfer, egress): Walks = futures::join!(
            self.walk(origin, board),
            async {
                match transfer_ends {
                    Some((from, to)) => self.walk(from, to).await,
                    None => None,
                }
            },
            self.walk(alight, destination),
        );

        let mut legs = Vec::with_capacity(6);
        let mut walking_distance_m = 0.0;
        let approach_secs = approach.as_ref().map_or(0, |w| w.duration_s);
        let egress_secs = egress.as_ref().map_or(0, |w| w.duration_s);

        if let Some(walk) = approach {
            walking_distance_m += walk.distance_m;
            legs.push(Leg::Walk(walk));
        }

        legs.push(Leg::Bus(self.bus_leg(first)));

        if let Some(second) = second {
            let transfer_secs = transfer.as_ref().map_or(0, |w| w.duration_s);
            if let Some(walk) = transfer {
                walking_distance_m += walk.distance_m;
                legs.push(Leg::Walk(walk));
            }
            let wait = second.departure - first.arrival - transfer_secs;
            if wait > 0 {
                legs.push(Leg::Wait(WaitLeg {
                    stop_id: second.board_stop_id.clone(),
                    stop_name: self.stop_name(&second.board_stop_id),
                    duration_s: wait,
                }));
            }
            legs.push(Leg::Bus(self.bus_leg(second)));
        }

        if let Some(walk) = egress {
            walking_distance_m += walk.distance_m;
            legs.push(Leg::Walk(walk));
        }

        let departure_secs = first.departure - approach_secs;
        let arrival_secs = last.arrival + egress_secs;

        Itinerary {
            legs,
            departure: format_clock(departure_secs),
            arrival: format_clock(arrival_secs),
            departure_secs,
            arrival_secs,
            duration_s: arrival_secs - departure_secs,
            walking_distance_m,
            transfers: candidate.transfers(),
            origin_label: None,
            destination_label: None,
        }
    }

    /// A walk leg, or `None` when the two points are practically the same.
    async fn walk(&self, from: LatLon, to: LatLon) -> Option<WalkLeg> {
        let straight_m = from.distance_m(&to);
        if straight_m < self.config.min_walk_leg_m {
            return None;
        }

        let routed = if straight_m > self.config.walk_provider_threshold_m {
            match self.walker.compute_walk(from, to).await {
                Ok(Some(route)) if route.polyline.len() >= 2 => Some(route),
                Ok(_) => {
                    debug!(distance_m = straight_m, "No walking route, using straight line");
                    None
                }
                Err(error) => {
                    warn!(%error, "Walking router failed, using straight line");
                    None
                }
            }
        } else {
            None
        };

        let is_routed = routed.is_some();
        let route = routed.unwrap_or_else(|| {
            WalkRoute::straight(
                from,
                to,
                self.config.walking_speed_mps,
                self.config.min_walk_secs,
            )
        });

        Some(WalkLeg {
            from,
            to,
            distance_m: route.distance_m,
            duration_s: route.duration_s.round() as i64,
            polyline: route.polyline,
            routed: is_routed,
        })
    }

    fn bus_leg(&self, ride: &DirectTrip) -> BusLeg {
        let trip = self.index.trip(&ride.trip_id);
        let route = self.index.route(&ride.route_id);
        let board = self.index.stop(&ride.board_stop_id).map(|s| s.location);
        let alight = self.index.stop(&ride.alight_stop_id).map(|s| s.location);

        let shape = trip
            .and_then(|t| t.shape_id.as_deref())
            .and_then(|id| self.index.shape(id));
        // A missing stop borrows the other end; with neither there is no line
        let geometry = match (board.or(alight), alight.or(board)) {
            (Some(board), Some(alight)) => clip_shape(shape, board, alight),
            _ => Vec::new(),
        };

        let intermediate_stops = self
            .index
            .schedule(&ride.trip_id)
            .map(|schedule| {
                schedule.stop_times()[ride.board_idx + 1..ride.alight_idx]
                    .iter()
                    .filter_map(|st| {
                        let stop = self.index.stop(&st.stop_id)?;
                        Some(IntermediateStop {
                            stop_id: stop.id.clone(),
                            name: stop.name.clone(),
                            location: stop.location,
                            time: format_clock(st.arrival.on_timeline(ride.day_offset)),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        BusLeg {
            route_id: ride.route_id.clone(),
            route_short_name: route.map(|r| r.short_name.clone()).unwrap_or_default(),
            route_long_name: route.map(|r| r.long_name.clone()).unwrap_or_default(),
            route_color: route
                .map(|r| r.color.clone())
                .unwrap_or_else(|| crate::domain::DEFAULT_ROUTE_COLOR.to_string()),
            route_text_color: route
                .map(|r| r.text_color.clone())
                .unwrap_or_else(|| crate::domain::DEFAULT_TEXT_COLOR.to_string()),
            headsign: trip.and_then(|t| t.headsign.clone()),
            trip_id: ride.trip_id.clone(),
            board_stop_id: ride.board_stop_id.clone(),
            board_stop_name: self.stop_name(&ride.board_stop_id),
            alight_stop_id: ride.alight_stop_id.clone(),
            alight_stop_name: self.stop_name(&ride.alight_stop_id),
            departure: format_clock(ride.departure),
            arrival: format_clock(ride.arrival),
            departure_secs: ride.departure,
            arrival_secs: ride.arrival,
            distance_m: polyline_length_m(&geometry),
            geometry,
            intermediate_stops,
        }
    }

    fn stop_location(&self, stop_id: &str, fallback: LatLon) -> LatLon {
        self.index.stop(stop_id).map_or(fallback, |s| s.location)
    }

    fn stop_name(&self, stop_id: &str) -> String {
        self.index
            .stop(stop_id)
            .map_or_else(|| stop_id.to_string(), |s| s.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::fixture::{FeedBuilder, WEEKDAYS};
    use crate::places::PlaceBackend;
    use crate::planner::{Hub, TransferCandidate};
    use crate::walking::{MockAnswer, MockWalker};

    struct FixedPlaces;

    impl PlaceResolver for FixedPlaces {
        async fn resolve(&self, point: LatLon) -> Option<String> {
            Some(format!("{:.3},{:.3}", point.lat, point.lon))
        }
    }

    fn index() -> FeedIndex {
        FeedBuilder::new()
            .quay("S1", "Gare", 45.1840, 0.7200, None)
            .quay("MID", "Préfecture", 45.1870, 0.7250, None)
            .quay("S2", "Mairie", 45.1900, 0.7300, None)
            .quay("HUB2", "Mairie Nord", 45.1910, 0.7300, None)
            .quay("S3", "Boulazac", 45.1950, 0.7600, None)
            .route("A", "A")
            .route("B", "B")
            .service("WD", WEEKDAYS)
            .shape("SH_A", &[(45.1840, 0.7200), (45.1860, 0.7230), (45.1870, 0.7250), (45.1900, 0.7300)])
            .trip_with_shape(
                "T1",
                "A",
                "WD",
                Some("SH_A"),
                &[("S1", "08:15:00"), ("MID", "08:22:00"), ("S2", "08:32:00")],
            )
            .trip("T2", "B", "WD", &[("HUB2", "08:45:00"), ("S3", "09:00:00")])
            .build()
    }

    fn ride(trip: &str, route: &str, stops: (&str, &str), idx: (usize, usize), times: (i64, i64)) -> DirectTrip {
        DirectTrip {
            trip_id: trip.into(),
            route_id: route.into(),
            service_id: "WD".into(),
            board_stop_id: stops.0.into(),
            alight_stop_id: stops.1.into(),
            board_idx: idx.0,
            alight_idx: idx.1,
            departure: times.0,
            arrival: times.1,
            day_offset: 0,
        }
    }

    fn t1() -> DirectTrip {
        ride("T1", "A", ("S1", "S2"), (0, 2), (29_700, 30_720))
    }

    #[tokio::test]
    async fn direct_itinerary_with_walks() {
        let index = index();
        let walker = MockWalker::new(MockAnswer::Detour(1.2));
        let config = AssemblerConfig::default();
        let assembler = Assembler::new(&index, &walker, &PlaceBackend::Disabled, &config);

        // ~330 m from S1, ~47 m from S2
        let origin = LatLon::new(45.1810, 0.7200);
        let destination = LatLon::new(45.1900, 0.7306);
        let itinerary = assembler
            .assemble(origin, destination, &Candidate::Direct(t1()))
            .await;

        assert_eq!(itinerary.legs.len(), 3);
        let walks: Vec<_> = itinerary.walk_legs().collect();
        assert!(walks[0].routed);
        assert!(!walks[1].routed);
        assert_eq!(walks[1].duration_s, (walks[1].distance_m / 1.35).round() as i64);
        assert_eq!(walker.call_count(), 1);

        let bus = itinerary.bus_legs().next().unwrap();
        assert_eq!(bus.departure, "08:15");
        assert_eq!(bus.arrival, "08:32");
        assert_eq!(bus.route_color, "0074D9");
        assert_eq!(bus.intermediate_stops.len(), 1);
        assert_eq!(bus.intermediate_stops[0].name, "Préfecture");
        assert_eq!(bus.intermediate_stops[0].time, "08:22");
        assert_eq!(bus.geometry.len(), 4);
        let s1 = index.stop("S1").unwrap().location;
        let s2 = index.stop("S2").unwrap().location;
        assert!(bus.distance_m > s1.distance_m(&s2));

        assert_eq!(itinerary.transfers, 0);
        assert_eq!(itinerary.arrival_secs, 30_720 + walks[1].duration_s);
        assert_eq!(itinerary.departure_secs, 29_700 - walks[0].duration_s);
        assert!(itinerary.origin_label.is_none());
    }

    #[test]
    fn unknown_stops_never_draw_from_null_island() {
        let index = index();
        let walker = MockWalker::new(MockAnswer::Fail);
        let config = AssemblerConfig::default();
        let assembler = Assembler::new(&index, &walker, &PlaceBackend::Disabled, &config);
        let s3 = index.stop("S3").unwrap().location;

        let leg = assembler.bus_leg(&ride("T2", "B", ("GONE", "S3"), (0, 1), (31_500, 32_400)));
        assert_eq!(leg.geometry, [s3, s3]);
        assert_eq!(leg.distance_m, 0.0);
        assert_eq!(leg.board_stop_name, "GONE");

        let leg = assembler.bus_leg(&ride("T2", "B", ("GONE", "LOST"), (0, 1), (31_500, 32_400)));
        assert!(leg.geometry.is_empty());
        assert_eq!(leg.distance_m, 0.0);
    }

    #[tokio::test]
    async fn tiny_walks_omitted() {
        let index = index();
        let walker = MockWalker::new(MockAnswer::Fail);
        let config = AssemblerConfig::default();
        let assembler = Assembler::new(&index, &walker, &PlaceBackend::Disabled, &config);

        let itinerary = assembler
            .assemble(
                LatLon::new(45.1840, 0.7200),
                LatLon::new(45.1900, 0.7300),
                &Candidate::Direct(t1()),
            )
            .await;
        assert_eq!(itinerary.legs.len(), 1);
        assert_eq!(itinerary.walking_distance_m, 0.0);
        assert_eq!(itinerary.duration_s, 30_720 - 29_700);
    }

    #[tokio::test]
    async fn router_failure_falls_back_to_straight_line() {
        let index = index();
        let walker = MockWalker::new(MockAnswer::Fail);
        let config = AssemblerConfig::default();
        let assembler = Assembler::new(&index, &walker, &PlaceBackend::Disabled, &config);

        let origin = LatLon::new(45.1810, 0.7200);
        let itinerary = assembler
            .assemble(origin, LatLon::new(45.1900, 0.7300), &Candidate::Direct(t1()))
            .await;

        let walk = itinerary.walk_legs().next().unwrap();
        assert!(!walk.routed);
        assert_eq!(walk.polyline.len(), 2);
        assert_eq!(walker.call_count(), 1);
    }

    #[tokio::test]
    async fn transfer_itinerary_has_walk_and_wait() {
        let index = index();
        let walker = MockWalker::new(MockAnswer::NoRoute);
        let config = AssemblerConfig::default();
        let assembler = Assembler::new(&index, &walker, &FixedPlaces, &config);

        let candidate = Candidate::Transfer(TransferCandidate {
            hub: Hub {
                origin_route: "A".into(),
                destination_route: "B".into(),
                alight_stop: "S2".into(),
                board_stop: "HUB2".into(),
                walk_m: 111.0,
                walk_secs: 83,
            },
            first: t1(),
            second: ride("T2", "B", ("HUB2", "S3"), (0, 1), (31_500, 32_400)),
        });

        let itineraries = assembler
            .assemble_all(LatLon::new(45.1840, 0.7200), LatLon::new(45.1950, 0.7600), &[candidate])
            .await;
        let itinerary = &itineraries[0];

        let kinds: Vec<&str> = itinerary
            .legs
            .iter()
            .map(|leg| match leg {
                Leg::Walk(_) => "walk",
                Leg::Bus(_) => "bus",
                Leg::Wait(_) => "wait",
            })
            .collect();
        assert_eq!(kinds, ["bus", "walk", "wait", "bus"]);
        assert_eq!(itinerary.transfers, 1);
        assert_eq!(itinerary.origin_label.as_deref(), Some("45.184,0.720"));

        let Leg::Wait(wait) = &itinerary.legs[2] else {
            unreachable!()
        };
        let Leg::Walk(walk) = &itinerary.legs[1] else {
            unreachable!()
        };
        assert_eq!(wait.duration_s, 31_500 - 30_720 - walk.duration_s);
        assert_eq!(wait.stop_name, "Mairie Nord");
    }

    #[test]
    fn serializes_tagged_legs() {
        let leg = Leg::Wait(WaitLeg {
            stop_id: "S2".into(),
            stop_name: "Mairie".into(),
            duration_s: 300,
        });
        let json = serde_json::to_value(&leg).unwrap();
        assert_eq!(json["type"], "wait");
        assert_eq!(json["duration_s"], 300);
    }
}
