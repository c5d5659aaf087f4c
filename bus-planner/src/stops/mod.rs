//! Stop clustering and geographic lookup.

mod cluster;
mod nearby;

pub use cluster::{expand_all, expand_to_boardable};
pub use nearby::{
    DEFAULT_LIMIT, DEFAULT_RADIUS_M, FUZZY_THRESHOLD, LookupStage, NearbyQuery, NearbyResult,
    NearbyStop, SAMPLE_SIZE, nearby,
};
