//! Typed parsing of feed tables.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::{
    CalendarException, CalendarRule, ExceptionKind, LatLon, LocationType, Route, ShapePoint, Stop,
    ServiceTime, StopTime, Trip, parse_feed_date,
};

use super::error::FeedError;
use super::table::Table;

/// The parsed, cleaned records of one feed version.
///
/// Rows that fail validation are dropped while parsing; everything here is
/// well-formed on its own. Cross-table consistency is checked by
/// [`FeedIndex::build`](super::FeedIndex::build).
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub trips: Vec<Trip>,
    /// `(trip_id, stop_time)` in file order.
    pub stop_times: Vec<(String, StopTime)>,
    pub calendars: Vec<CalendarRule>,
    pub calendar_dates: Vec<CalendarException>,
    pub shapes: Vec<ShapePoint>,
}

/// Raw table sources for [`Feed::from_readers`].
pub struct FeedReaders {
    pub stops: Box<dyn Read>,
    pub routes: Box<dyn Read>,
    pub trips: Box<dyn Read>,
    pub stop_times: Box<dyn Read>,
    pub calendar: Option<Box<dyn Read>>,
    pub calendar_dates: Option<Box<dyn Read>>,
    pub shapes: Option<Box<dyn Read>>,
}

impl FeedReaders {
    /// Open the tables of a feed directory.
    ///
    /// `stops.txt`, `routes.txt`, `trips.txt` and `stop_times.txt` are
    /// required; `calendar.txt`, `calendar_dates.txt` and `shapes.txt` are
    /// optional.
    pub fn open_dir(dir: &Path) -> Result<Self, FeedError> {
        Ok(Self {
            stops: open_required(dir, "stops.txt")?,
            routes: open_required(dir, "routes.txt")?,
            trips: open_required(dir, "trips.txt")?,
            stop_times: open_required(dir, "stop_times.txt")?,
            calendar: open_optional(dir, "calendar.txt")?,
            calendar_dates: open_optional(dir, "calendar_dates.txt")?,
            shapes: open_optional(dir, "shapes.txt")?,
        })
    }
}

impl Feed {
    /// Load a feed from a directory of `.txt` tables.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let dir = dir.as_ref();
        info!(path = %dir.display(), "Loading feed");
        Self::from_readers(FeedReaders::open_dir(dir)?)
    }

    /// Parse a feed from already-opened table sources.
    pub fn from_readers(readers: FeedReaders) -> Result<Self, FeedError> {
        let feed = Self {
            stops: parse_stops(readers.stops)?,
            routes: parse_routes(readers.routes)?,
            trips: parse_trips(readers.trips)?,
            stop_times: parse_stop_times(readers.stop_times)?,
            calendars: readers.calendar.map(parse_calendar).transpose()?.unwrap_or_default(),
            calendar_dates: readers
                .calendar_dates
                .map(parse_calendar_dates)
                .transpose()?
                .unwrap_or_default(),
            shapes: readers.shapes.map(parse_shapes).transpose()?.unwrap_or_default(),
        };

        info!(
            stops = feed.stops.len(),
            routes = feed.routes.len(),
            trips = feed.trips.len(),
            stop_times = feed.stop_times.len(),
            calendars = feed.calendars.len(),
            calendar_dates = feed.calendar_dates.len(),
            shape_points = feed.shapes.len(),
            "Parsed feed"
        );

        Ok(feed)
    }
}

fn open_required(dir: &Path, file: &'static str) -> Result<Box<dyn Read>, FeedError> {
    open_optional(dir, file)?.ok_or(FeedError::MissingFile(file))
}

fn open_optional(dir: &Path, file: &'static str) -> Result<Option<Box<dyn Read>>, FeedError> {
    let path = dir.join(file);
    if !path.is_file() {
        debug!(file, "Optional feed file absent");
        return Ok(None);
    }
    File::open(&path)
        .map(|f| Some(Box::new(BufReader::new(f)) as Box<dyn Read>))
        .map_err(|source| FeedError::Io { path, source })
}

fn log_skipped(table: &Table, skipped: usize) {
    if skipped > 0 {
        warn!(file = table.file(), skipped, "Skipped invalid feed records");
    }
    debug!(file = table.file(), rows = table.len(), "Parsed feed table");
}

/// Parse `stops.txt`.
pub fn parse_stops<R: Read>(reader: R) -> Result<Vec<Stop>, FeedError> {
    let table = Table::read("stops.txt", reader)?;
    let id = table.require("stop_id")?;
    let name = table.column("stop_name");
    let lat = table.require("stop_lat")?;
    let lon = table.require("stop_lon")?;
    let parent = table.column("parent_station");
    let location_type = table.column("location_type");

    let mut stops = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.rows() {
        let (Ok(lat), Ok(lon)) = (row.at(lat).parse::<f64>(), row.at(lon).parse::<f64>()) else {
            skipped += 1;
            continue;
        };
        let location = LatLon::new(lat, lon);
        if !location.is_valid() {
            skipped += 1;
            continue;
        }
        match Stop::new(
            row.at(id),
            row.get(name),
            location,
            row.opt(parent),
            LocationType::from_gtfs(row.get(location_type)),
        ) {
            Ok(stop) => stops.push(stop),
            Err(_) => skipped += 1,
        }
    }
    log_skipped(&table, skipped);
    Ok(stops)
}

/// Parse `routes.txt`.
pub fn parse_routes<R: Read>(reader: R) -> Result<Vec<Route>, FeedError> {
    let table = Table::read("routes.txt", reader)?;
    let id = table.require("route_id")?;
    let short = table.column("route_short_name");
    let long = table.column("route_long_name");
    let color = table.column("route_color");
    let text_color = table.column("route_text_color");

    let mut routes = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.rows() {
        match Route::new(
            row.at(id),
            row.get(short),
            row.get(long),
            color.map(|_| row.get(color)),
            text_color.map(|_| row.get(text_color)),
        ) {
            Ok(route) => routes.push(route),
            Err(_) => skipped += 1,
        }
    }
    log_skipped(&table, skipped);
    Ok(routes)
}

/// Parse `trips.txt`.
pub fn parse_trips<R: Read>(reader: R) -> Result<Vec<Trip>, FeedError> {
    let table = Table::read("trips.txt", reader)?;
    let id = table.require("trip_id")?;
    let route = table.require("route_id")?;
    let service = table.require("service_id")?;
    let shape = table.column("shape_id");
    let headsign = table.column("trip_headsign");

    let mut trips = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.rows() {
        if row.at(route).is_empty() || row.at(service).is_empty() {
            skipped += 1;
            continue;
        }
        match Trip::new(
            row.at(id),
            row.at(route),
            row.at(service),
            row.opt(shape),
            row.opt(headsign),
        ) {
            Ok(trip) => trips.push(trip),
            Err(_) => skipped += 1,
        }
    }
    log_skipped(&table, skipped);
    Ok(trips)
}

/// Parse `stop_times.txt`.
///
/// A row with only one of arrival/departure borrows the other; a row with
/// neither (untimed intermediate stop) is dropped.
pub fn parse_stop_times<R: Read>(reader: R) -> Result<Vec<(String, StopTime)>, FeedError> {
    let table = Table::read("stop_times.txt", reader)?;
    let trip = table.require("trip_id")?;
    let stop = table.require("stop_id")?;
    let arrival = table.column("arrival_time");
    let departure = table.column("departure_time");
    let sequence = table.require("stop_sequence")?;

    let mut stop_times = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.rows() {
        let trip_id = row.at(trip);
        let stop_id = row.at(stop);
        let Ok(seq) = row.at(sequence).parse::<u32>() else {
            skipped += 1;
            continue;
        };
        if trip_id.is_empty() || stop_id.is_empty() {
            skipped += 1;
            continue;
        }

        let arr = ServiceTime::parse(row.get(arrival)).ok();
        let dep = ServiceTime::parse(row.get(departure)).ok();
        let (arr, dep) = match (arr, dep) {
            (Some(a), Some(d)) => (a, d),
            (Some(a), None) => (a, a),
            (None, Some(d)) => (d, d),
            (None, None) => {
                skipped += 1;
                continue;
            }
        };

        stop_times.push((trip_id.to_string(), StopTime::new(stop_id, arr, dep, seq)));
    }
    log_skipped(&table, skipped);
    Ok(stop_times)
}

/// Parse `calendar.txt`.
pub fn parse_calendar<R: Read>(reader: R) -> Result<Vec<CalendarRule>, FeedError> {
    const DAYS: [&str; 7] = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];

    let table = Table::read("calendar.txt", reader)?;
    let service = table.require("service_id")?;
    let start = table.require("start_date")?;
    let end = table.require("end_date")?;
    let day_columns = DAYS.map(|d| table.column(d));

    let mut rules = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.rows() {
        let service_id = row.at(service);
        let (Some(start_date), Some(end_date)) =
            (parse_feed_date(row.at(start)), parse_feed_date(row.at(end)))
        else {
            skipped += 1;
            continue;
        };
        if service_id.is_empty() {
            skipped += 1;
            continue;
        }

        rules.push(CalendarRule {
            service_id: service_id.to_string(),
            days: day_columns.map(|col| row.get(col) == "1"),
            start_date,
            end_date,
        });
    }
    log_skipped(&table, skipped);
    Ok(rules)
}

/// Parse `calendar_dates.txt`.
pub fn parse_calendar_dates<R: Read>(reader: R) -> Result<Vec<CalendarException>, FeedError> {
    let table = Table::read("calendar_dates.txt", reader)?;
    let service = table.require("service_id")?;
    let date = table.require("date")?;
    let kind = table.require("exception_type")?;

    let mut exceptions = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.rows() {
        let service_id = row.at(service);
        let (Some(date), Some(kind)) = (
            parse_feed_date(row.at(date)),
            ExceptionKind::from_gtfs(row.at(kind)),
        ) else {
            skipped += 1;
            continue;
        };
        if service_id.is_empty() {
            skipped += 1;
            continue;
        }
        exceptions.push(CalendarException {
            service_id: service_id.to_string(),
            date,
            kind,
        });
    }
    log_skipped(&table, skipped);
    Ok(exceptions)
}

/// Parse `shapes.txt`.
pub fn parse_shapes<R: Read>(reader: R) -> Result<Vec<ShapePoint>, FeedError> {
    let table = Table::read("shapes.txt", reader)?;
    let id = table.require("shape_id")?;
    let lat = table.require("shape_pt_lat")?;
    let lon = table.require("shape_pt_lon")?;
    let sequence = table.require("shape_pt_sequence")?;

    let mut points = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.rows() {
        let shape_id = row.at(id);
        let (Ok(lat), Ok(lon), Ok(seq)) = (
            row.at(lat).parse::<f64>(),
            row.at(lon).parse::<f64>(),
            row.at(sequence).parse::<u32>(),
        ) else {
            skipped += 1;
            continue;
        };
        let location = LatLon::new(lat, lon);
        if shape_id.is_empty() || !location.is_valid() {
            skipped += 1;
            continue;
        }
        points.push(ShapePoint {
            shape_id: shape_id.to_string(),
            sequence: seq,
            location,
        });
    }
    log_skipped(&table, skipped);
    Ok(points)
}
