//! In-memory walking router for tests and offline runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::LatLon;

use super::error::WalkingError;
use super::{WalkRoute, WalkingProvider};

/// What the mock answers to every request.
#[derive(Debug, Clone)]
pub enum MockAnswer {
    /// A route scaled from the straight line: distance times `detour`.
    Detour(f64),
    NoRoute,
    Fail,
}

/// Walking router that never touches the network.
#[derive(Debug, Clone)]
pub struct MockWalker {
    answer: MockAnswer,
    calls: Arc<AtomicUsize>,
}

impl MockWalker {
    pub fn new(answer: MockAnswer) -> Self {
        Self {
            answer,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of routes requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl WalkingProvider for MockWalker {
    async fn compute_walk(
        &self,
        from: LatLon,
        to: LatLon,
    ) -> Result<Option<WalkRoute>, WalkingError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.answer {
            MockAnswer::Detour(factor) => {
                let distance_m = from.distance_m(&to) * factor;
                let mid = LatLon::new((from.lat + to.lat) / 2.0, from.lon);
                Ok(Some(WalkRoute {
                    polyline: vec![from, mid, to],
                    distance_m,
                    duration_s: distance_m / 1.2,
                }))
            }
            MockAnswer::NoRoute => Ok(None),
            MockAnswer::Fail => Err(WalkingError::Api {
                status: 503,
                message: "mock failure".to_string(),
            }),
        }
    }
}
