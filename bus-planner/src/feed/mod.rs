//! Static transit feed loading and indexing.
//!
//! [`Feed`] holds the cleaned records of the feed's tables and
//! [`FeedIndex`] the lookups searches run against.

mod error;
mod index;
mod loader;
mod table;

#[cfg(test)]
pub(crate) mod fixture;

pub use error::FeedError;
pub use index::{FeedIndex, StopVisit};
pub use loader::{
    Feed, FeedReaders, parse_calendar, parse_calendar_dates, parse_routes, parse_shapes,
    parse_stop_times, parse_stops, parse_trips,
};
pub use table::clean_field;
