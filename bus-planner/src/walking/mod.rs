//! Walking routes between coordinates.
//!
//! Itineraries need a walking path for the approach to the first stop, the
//! egress from the last one and pair-hub transfers. Routes come from an
//! external OSRM-compatible router when one is configured; otherwise, and
//! whenever the router fails, a straight segment is used.

mod client;
mod error;
mod mock;

pub use client::{OsrmClient, WalkingConfig, parse_route};
pub use error::WalkingError;
pub use mock::{MockAnswer, MockWalker};

use std::future::Future;

use serde::Serialize;

use crate::domain::LatLon;

/// A walking path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkRoute {
    pub polyline: Vec<LatLon>,
    pub distance_m: f64,
    pub duration_s: f64,
}

impl WalkRoute {
    /// Straight segment between two points at `speed_mps`, never shorter
    /// than `min_secs`.
    pub fn straight(from: LatLon, to: LatLon, speed_mps: f64, min_secs: f64) -> Self {
        let distance_m = from.distance_m(&to);
        let duration_s = if speed_mps > 0.0 {
            (distance_m / speed_mps).max(min_secs)
        } else {
            min_secs
        };
        Self {
            polyline: vec![from, to],
            distance_m,
            duration_s,
        }
    }
}

/// Source of walking routes.
pub trait WalkingProvider: Send + Sync {
    /// Route on foot from `from` to `to`. `Ok(None)` when no route exists.
    fn compute_walk(
        &self,
        from: LatLon,
        to: LatLon,
    ) -> impl Future<Output = Result<Option<WalkRoute>, WalkingError>> + Send;
}

/// The walking provider selected at startup.
#[derive(Debug, Clone)]
pub enum WalkingBackend {
    Osrm(OsrmClient),
    /// No router: every walk is a straight segment.
    StraightLine,
}

impl WalkingProvider for WalkingBackend {
    async fn compute_walk(
        &self,
        from: LatLon,
        to: LatLon,
    ) -> Result<Option<WalkRoute>, WalkingError> {
        match self {
            Self::Osrm(client) => client.compute_walk(from, to).await,
            Self::StraightLine => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_route_minimum_duration() {
        let a = LatLon::new(45.184, 0.72);
        let b = LatLon::new(45.1841, 0.72);
        let route = WalkRoute::straight(a, b, 1.35, 30.0);
        assert_eq!(route.polyline, vec![a, b]);
        assert_eq!(route.duration_s, 30.0);

        let far = LatLon::new(45.19, 0.73);
        let route = WalkRoute::straight(a, far, 1.35, 30.0);
        assert!((route.duration_s - route.distance_m / 1.35).abs() < 1e-9);
    }

    #[tokio::test]
    async fn straight_line_backend_defers_to_caller() {
        let a = LatLon::new(45.184, 0.72);
        let b = LatLon::new(45.19, 0.73);
        assert!(WalkingBackend::StraightLine.compute_walk(a, b).await.unwrap().is_none());
    }
}
