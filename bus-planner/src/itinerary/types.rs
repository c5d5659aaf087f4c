//! Itineraries as returned to clients.

use serde::Serialize;

use crate::domain::LatLon;

/// A door-to-door itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub legs: Vec<Leg>,
    /// `HH:MM` at the origin, including the approach walk.
    pub departure: String,
    /// `HH:MM` at the destination, including the egress walk.
    pub arrival: String,
    pub departure_secs: i64,
    pub arrival_secs: i64,
    pub duration_s: i64,
    pub walking_distance_m: f64,
    pub transfers: usize,
    pub origin_label: Option<String>,
    pub destination_label: Option<String>,
}

impl Itinerary {
    pub fn bus_legs(&self) -> impl Iterator<Item = &BusLeg> {
        self.legs.iter().filter_map(|leg| match leg {
            Leg::Bus(bus) => Some(bus),
            _ => None,
        })
    }

    pub fn walk_legs(&self) -> impl Iterator<Item = &WalkLeg> {
        self.legs.iter().filter_map(|leg| match leg {
            Leg::Walk(walk) => Some(walk),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Leg {
    Walk(WalkLeg),
    Bus(BusLeg),
    Wait(WaitLeg),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkLeg {
    pub from: LatLon,
    pub to: LatLon,
    pub distance_m: f64,
    pub duration_s: i64,
    pub polyline: Vec<LatLon>,
    /// True when the path came from the walking router.
    pub routed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusLeg {
    pub route_id: String,
    pub route_short_name: String,
    pub route_long_name: String,
    pub route_color: String,
    pub route_text_color: String,
    pub headsign: Option<String>,
    pub trip_id: String,
    pub board_stop_id: String,
    pub board_stop_name: String,
    pub alight_stop_id: String,
    pub alight_stop_name: String,
    pub departure: String,
    pub arrival: String,
    pub departure_secs: i64,
    pub arrival_secs: i64,
    /// Length of `geometry` in metres.
    pub distance_m: f64,
    pub geometry: Vec<LatLon>,
    pub intermediate_stops: Vec<IntermediateStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntermediateStop {
    pub stop_id: String,
    pub name: String,
    pub location: LatLon,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitLeg {
    pub stop_id: String,
    pub stop_name: String,
    pub duration_s: i64,
}
