//! Data transfer objects for web requests and responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::DayClassification;
use crate::domain::{DomainError, LatLon, SearchMode};
use crate::engine::{FeedStatus, PlanOutcome, PlanRequest};
use crate::itinerary::Itinerary;
use crate::stops::{LookupStage, NearbyQuery};

/// Largest `limit` accepted by the nearby endpoint.
const MAX_NEARBY_LIMIT: usize = 50;

/// A coordinate in requests.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PointDto {
    pub lat: f64,
    pub lon: f64,
}

impl From<PointDto> for LatLon {
    fn from(p: PointDto) -> Self {
        LatLon::new(p.lat, p.lon)
    }
}

/// Request to plan itineraries.
#[derive(Debug, Deserialize)]
pub struct PlanItinerariesRequest {
    pub origin: PointDto,

    pub destination: PointDto,

    /// Service date (YYYY-MM-DD)
    pub date: NaiveDate,

    /// Clock time in HH:MM format
    pub time: String,

    /// `depart` (default) or `arrive`
    pub mode: Option<String>,

    /// Search window in minutes
    pub window_mins: Option<i64>,

    /// Stop ids to use at the origin regardless of distance
    #[serde(default)]
    pub origin_stop_ids: Vec<String>,

    #[serde(default)]
    pub destination_stop_ids: Vec<String>,

    /// Place names, used when no stop is close enough
    pub origin_label: Option<String>,

    pub destination_label: Option<String>,
}

impl PlanItinerariesRequest {
    /// Convert into an engine request, parsing the mode.
    pub fn into_plan_request(self, session_id: Option<String>) -> Result<PlanRequest, DomainError> {
        let mode = match self.mode.as_deref() {
            Some(mode) => mode.parse()?,
            None => SearchMode::Depart,
        };

        Ok(PlanRequest {
            origin: self.origin.into(),
            destination: self.destination.into(),
            date: self.date,
            time: self.time,
            mode,
            window_mins: self.window_mins,
            origin_stop_ids: self.origin_stop_ids,
            destination_stop_ids: self.destination_stop_ids,
            origin_label: self.origin_label,
            destination_label: self.destination_label,
            session_id,
        })
    }
}

/// Response for itinerary planning.
#[derive(Debug, Serialize)]
pub struct PlanItinerariesResponse {
    /// Itineraries, best first
    pub itineraries: Vec<Itinerary>,

    pub origin_stages: Vec<LookupStage>,

    pub destination_stages: Vec<LookupStage>,

    /// Number of transfer hubs explored (0 when a direct trip was found)
    pub hubs_explored: usize,
}

impl From<PlanOutcome> for PlanItinerariesResponse {
    fn from(outcome: PlanOutcome) -> Self {
        Self {
            itineraries: outcome.itineraries,
            origin_stages: outcome.origin_stages,
            destination_stages: outcome.destination_stages,
            hubs_explored: outcome.hubs_explored,
        }
    }
}

/// Query for stops around a point.
#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub lat: f64,
    pub lon: f64,

    /// Radius in metres
    pub radius: Option<f64>,

    pub limit: Option<usize>,

    /// Place name for the fuzzy fallback
    pub label: Option<String>,
}

impl NearbyParams {
    pub fn to_query(&self) -> NearbyQuery {
        let mut query = NearbyQuery::new(LatLon::new(self.lat, self.lon))
            .with_label(self.label.clone());
        if let Some(radius) = self.radius.filter(|r| r.is_finite() && *r > 0.0) {
            query = query.with_radius(radius);
        }
        if let Some(limit) = self.limit {
            query = query.with_limit(limit.min(MAX_NEARBY_LIMIT));
        }
        query
    }
}

/// Query for the calendar endpoint.
#[derive(Debug, Deserialize)]
pub struct CalendarDayParams {
    pub date: NaiveDate,
}

/// Services and classification of one date.
#[derive(Debug, Serialize)]
pub struct CalendarDayResponse {
    pub date: NaiveDate,

    /// Active service ids, sorted
    pub active_services: Vec<String>,

    pub classification: DayClassification,
}

/// Feed status.
#[derive(Debug, Serialize)]
pub struct FeedStatusResponse {
    pub loaded: bool,

    #[serde(flatten)]
    pub status: Option<FeedStatus>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_request_defaults() {
        let json = r#"{
            "origin": {"lat": 45.184, "lon": 0.72},
            "destination": {"lat": 45.19, "lon": 0.73},
            "date": "2025-03-10",
            "time": "08:00"
        }"#;
        let dto: PlanItinerariesRequest = serde_json::from_str(json).unwrap();
        let request = dto.into_plan_request(Some("s".into())).unwrap();

        assert_eq!(request.mode, SearchMode::Depart);
        assert!(request.origin_stop_ids.is_empty());
        assert_eq!(request.window_mins, None);
        assert_eq!(request.session_id.as_deref(), Some("s"));
        assert_eq!(request.destination, LatLon::new(45.19, 0.73));
    }

    #[test]
    fn plan_request_rejects_unknown_mode() {
        let json = r#"{
            "origin": {"lat": 45.184, "lon": 0.72},
            "destination": {"lat": 45.19, "lon": 0.73},
            "date": "2025-03-10",
            "time": "08:00",
            "mode": "soon"
        }"#;
        let dto: PlanItinerariesRequest = serde_json::from_str(json).unwrap();
        assert!(dto.into_plan_request(None).is_err());
    }

    #[test]
    fn nearby_params_cap_limit() {
        let params = NearbyParams {
            lat: 45.184,
            lon: 0.72,
            radius: Some(-5.0),
            limit: Some(500),
            label: Some("  ".into()),
        };
        let query = params.to_query();
        assert_eq!(query.limit, MAX_NEARBY_LIMIT);
        assert_eq!(query.radius_m, crate::stops::DEFAULT_RADIUS_M);
        assert!(query.label.is_none());
    }

    #[test]
    fn unloaded_status_serializes_flag_only() {
        let body = serde_json::to_value(FeedStatusResponse {
            loaded: false,
            status: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"loaded": false}));
    }
}
