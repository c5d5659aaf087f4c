//! Domain types for the bus itinerary engine.
//!
//! This module contains the validated feed records (stops, routes, trips,
//! stop times, calendars) and the time and coordinate types searches work
//! with. Types enforce their invariants at construction time, so code that
//! receives them can trust their validity.

mod error;
mod geo;
mod route;
mod service;
mod stop;
mod time;
mod trip;

pub use error::DomainError;
pub use geo::{EARTH_RADIUS_M, LatLon, ShapePoint, haversine_m};
pub use route::{DEFAULT_ROUTE_COLOR, DEFAULT_TEXT_COLOR, Route, normalize_color};
pub use service::{CalendarException, CalendarRule, ExceptionKind, parse_feed_date};
pub use stop::{LocationType, Stop};
pub use time::{DAY_SECS, SearchMode, ServiceTime, TimeWindow, format_clock, parse_clock};
pub use trip::{StopTime, Trip, TripSchedule};
