//! Itinerary planner over the feed index.
//!
//! A search first looks for single trips linking stops near the origin with
//! stops near the destination. Only when there are none does it look for
//! two-trip connections through transfer hubs.

mod cancel;
mod config;
mod direct;
mod rank;
mod search;
mod transfer;


pub use cancel::{CancelToken, SupersedeRegistry};
pub use config::SearchConfig;
pub use direct::{DayContext, DirectTrip, day_contexts, find_direct_trips, match_trip};
pub use rank::{sort_direct, sort_transfers};
pub use search::{Candidate, Planner, SearchError, SearchRequest, SearchResult};
pub use transfer::{Hub, TransferCandidate, TransferQuery, find_hubs, find_transfers};
