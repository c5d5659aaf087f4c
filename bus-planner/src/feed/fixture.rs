//! Small in-memory feeds for tests.

use chrono::NaiveDate;

use crate::domain::{
    CalendarException, CalendarRule, ExceptionKind, LatLon, LocationType, Route, ServiceTime,
    ShapePoint, Stop, StopTime, Trip,
};

use super::{Feed, FeedIndex};

pub const WEEKDAYS: [bool; 7] = [true, true, true, true, true, false, false];

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Builds a [`Feed`] record by record.
#[derive(Default)]
pub struct FeedBuilder {
    feed: Feed,
}

impl FeedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn station(mut self, id: &str, name: &str, lat: f64, lon: f64) -> Self {
        self.feed.stops.push(
            Stop::new(id, name, LatLon::new(lat, lon), None, LocationType::Station).unwrap(),
        );
        self
    }

    pub fn quay(mut self, id: &str, name: &str, lat: f64, lon: f64, parent: Option<&str>) -> Self {
        self.feed.stops.push(
            Stop::new(
                id,
                name,
                LatLon::new(lat, lon),
                parent.map(str::to_string),
                LocationType::Quay,
            )
            .unwrap(),
        );
        self
    }

    pub fn route(mut self, id: &str, short_name: &str) -> Self {
        self.feed
            .routes
            .push(Route::new(id, short_name, format!("Ligne {short_name}"), None, None).unwrap());
        self
    }

    /// A service running on `days` throughout 2025.
    pub fn service(mut self, id: &str, days: [bool; 7]) -> Self {
        self.feed.calendars.push(CalendarRule {
            service_id: id.to_string(),
            days,
            start_date: date(2025, 1, 1),
            end_date: date(2025, 12, 31),
        });
        self
    }

    pub fn exception(mut self, id: &str, on: NaiveDate, kind: ExceptionKind) -> Self {
        self.feed.calendar_dates.push(CalendarException {
            service_id: id.to_string(),
            date: on,
            kind,
        });
        self
    }

    /// A trip calling at `(stop, HH:MM:SS)` pairs in order; arrival equals departure.
    pub fn trip(self, id: &str, route: &str, service: &str, calls: &[(&str, &str)]) -> Self {
        self.trip_with_shape(id, route, service, None, calls)
    }

    pub fn trip_with_shape(
        mut self,
        id: &str,
        route: &str,
        service: &str,
        shape: Option<&str>,
        calls: &[(&str, &str)],
    ) -> Self {
        self.feed.trips.push(
            Trip::new(
                id,
                route,
                service,
                shape.map(str::to_string),
                Some(format!("{route} headsign")),
            )
            .unwrap(),
        );
        for (seq, (stop, time)) in calls.iter().enumerate() {
            let t = ServiceTime::parse(time).unwrap();
            self.feed
                .stop_times
                .push((id.to_string(), StopTime::new(*stop, t, t, seq as u32 + 1)));
        }
        self
    }

    pub fn shape(mut self, id: &str, points: &[(f64, f64)]) -> Self {
        for (seq, (lat, lon)) in points.iter().enumerate() {
            self.feed.shapes.push(ShapePoint {
                shape_id: id.to_string(),
                sequence: seq as u32,
                location: LatLon::new(*lat, *lon),
            });
        }
        self
    }

    pub fn feed(self) -> Feed {
        self.feed
    }

    pub fn build(self) -> FeedIndex {
        FeedIndex::build(self.feed)
    }
}
