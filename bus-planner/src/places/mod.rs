//! Human-readable names for coordinates.
//!
//! Itinerary endpoints are raw coordinates; a reverse geocoder turns them
//! into labels like "12 Rue Taillefer, Périgueux". Resolution is best effort:
//! any failure leaves the label empty.

mod client;
mod error;

pub use client::{NominatimClient, PlacesConfig, parse_place};
pub use error::PlaceError;

use std::future::Future;

use crate::domain::LatLon;

/// Source of place labels.
pub trait PlaceResolver: Send + Sync {
    fn resolve(&self, point: LatLon) -> impl Future<Output = Option<String>> + Send;
}

/// The place resolver selected at startup.
#[derive(Debug, Clone)]
pub enum PlaceBackend {
    Nominatim(NominatimClient),
    Disabled,
}

impl PlaceResolver for PlaceBackend {
    async fn resolve(&self, point: LatLon) -> Option<String> {
        match self {
            Self::Nominatim(client) => client.resolve(point).await,
            Self::Disabled => None,
        }
    }
}
