//! Finding candidate stops around a point.
//!
//! Lookup runs an ordered list of strategies. Forced ids and the radius
//! search always run; the fuzzy name match only when both found nothing, and
//! the sample only when everything else failed.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::domain::{LatLon, Stop};
use crate::feed::FeedIndex;

/// Default search radius in metres.
pub const DEFAULT_RADIUS_M: f64 = 600.0;

/// Default maximum number of stops returned.
pub const DEFAULT_LIMIT: usize = 15;

/// Minimum Jaro-Winkler similarity for a fuzzy name match.
pub const FUZZY_THRESHOLD: f64 = 0.85;

/// Number of master stops in the last-resort sample.
pub const SAMPLE_SIZE: usize = 5;

/// Which strategy produced a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupStage {
    Forced,
    Radius,
    Fuzzy,
    Sample,
}

/// A geo search request.
#[derive(Debug, Clone)]
pub struct NearbyQuery {
    pub point: LatLon,
    pub radius_m: f64,
    pub limit: usize,
    /// Stop ids supplied by the caller; kept first when present in the feed.
    pub forced_ids: Vec<String>,
    /// Free-text place name for the fuzzy fallback.
    pub label: Option<String>,
    pub allow_sample: bool,
}

impl NearbyQuery {
    pub fn new(point: LatLon) -> Self {
        Self {
            point,
            radius_m: DEFAULT_RADIUS_M,
            limit: DEFAULT_LIMIT,
            forced_ids: Vec::new(),
            label: None,
            allow_sample: true,
        }
    }

    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_forced(mut self, ids: Vec<String>) -> Self {
        self.forced_ids = ids;
        self
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn without_sample(mut self) -> Self {
        self.allow_sample = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyStop {
    pub stop_id: String,
    pub name: String,
    pub location: LatLon,
    pub distance_m: f64,
    pub is_station: bool,
    pub stage: LookupStage,
}

impl NearbyStop {
    fn from_stop(stop: &Stop, point: LatLon, stage: LookupStage) -> Self {
        Self {
            stop_id: stop.id.clone(),
            name: stop.name.clone(),
            location: stop.location,
            distance_m: point.distance_m(&stop.location),
            is_station: stop.is_station(),
            stage,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NearbyResult {
    pub stops: Vec<NearbyStop>,
    /// Strategies that contributed, in the order they ran.
    pub stages: Vec<LookupStage>,
}

impl NearbyResult {
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn stop_ids(&self) -> impl Iterator<Item = &str> {
        self.stops.iter().map(|s| s.stop_id.as_str())
    }

    fn push_stage(&mut self, stage: LookupStage, stops: Vec<NearbyStop>) {
        if !stops.is_empty() {
            self.stages.push(stage);
            self.stops.extend(stops);
        }
    }
}

/// Resolve candidate stops for a query.
pub fn nearby(index: &FeedIndex, query: &NearbyQuery) -> NearbyResult {
    let mut result = NearbyResult::default();

    let forced = forced_stops(index, query);
    let remaining = query.limit.saturating_sub(forced.len());
    let radius: Vec<NearbyStop> = within_radius(index, query)
        .into_iter()
        .filter(|s| !forced.iter().any(|f| f.stop_id == s.stop_id))
        .take(remaining)
        .collect();

    result.push_stage(LookupStage::Forced, forced);
    result.push_stage(LookupStage::Radius, radius);

    if result.is_empty() {
        if let Some(label) = &query.label {
            result.push_stage(LookupStage::Fuzzy, fuzzy_by_name(index, query, label));
        }
    }

    if result.is_empty() && query.allow_sample {
        result.push_stage(LookupStage::Sample, sample(index, query));
    }

    debug!(
        lat = query.point.lat,
        lon = query.point.lon,
        found = result.stops.len(),
        stages = ?result.stages,
        "Resolved nearby stops"
    );

    result
}

fn forced_stops(index: &FeedIndex, query: &NearbyQuery) -> Vec<NearbyStop> {
    let mut out: Vec<NearbyStop> = Vec::new();
    for id in &query.forced_ids {
        if out.iter().any(|s| &s.stop_id == id) {
            continue;
        }
        if let Some(stop) = index.stop(id) {
            out.push(NearbyStop::from_stop(stop, query.point, LookupStage::Forced));
        }
    }
    out
}

/// Quays before stations, then nearest first, then by name.
fn within_radius(index: &FeedIndex, query: &NearbyQuery) -> Vec<NearbyStop> {
    let mut found: Vec<NearbyStop> = index
        .stops()
        .map(|s| NearbyStop::from_stop(s, query.point, LookupStage::Radius))
        .filter(|s| s.distance_m <= query.radius_m)
        .collect();

    found.sort_by(|a, b| {
        a.is_station
            .cmp(&b.is_station)
            .then(a.distance_m.partial_cmp(&b.distance_m).unwrap_or(Ordering::Equal))
            .then_with(|| a.name.cmp(&b.name))
    });
    found
}

fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn name_score(label: &str, name: &str) -> Option<f64> {
    if label.is_empty() || name.is_empty() {
        return None;
    }
    let similarity = strsim::jaro_winkler(label, name);
    if similarity >= FUZZY_THRESHOLD {
        Some(similarity)
    } else if name.contains(label) || label.contains(name) {
        Some(FUZZY_THRESHOLD)
    } else {
        None
    }
}

fn fuzzy_by_name(index: &FeedIndex, query: &NearbyQuery, label: &str) -> Vec<NearbyStop> {
    let label = normalize_name(label);

    let mut scored: Vec<(f64, NearbyStop)> = index
        .master_stops()
        .iter()
        .filter_map(|id| index.stop(id))
        .filter_map(|stop| {
            name_score(&label, &normalize_name(&stop.name))
                .map(|score| (score, NearbyStop::from_stop(stop, query.point, LookupStage::Fuzzy)))
        })
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then(a.distance_m.partial_cmp(&b.distance_m).unwrap_or(Ordering::Equal))
            .then_with(|| a.stop_id.cmp(&b.stop_id))
    });
    scored
        .into_iter()
        .take(query.limit)
        .map(|(_, stop)| stop)
        .collect()
}

fn sample(index: &FeedIndex, query: &NearbyQuery) -> Vec<NearbyStop> {
    index
        .master_stops()
        .iter()
        .filter_map(|id| index.stop(id))
        .take(SAMPLE_SIZE)
        .map(|stop| NearbyStop::from_stop(stop, query.point, LookupStage::Sample))
        .collect()
}
