//! OSRM-compatible foot routing over HTTP.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::domain::LatLon;

use super::error::WalkingError;
use super::{WalkRoute, WalkingProvider};

/// Default base URL for the public OSRM demo server.
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for the walking router client.
#[derive(Debug, Clone)]
pub struct WalkingConfig {
    /// Base URL of the router
    pub base_url: String,
    /// Routing profile segment of the URL
    pub profile: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: "foot".to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
        }
    }
}

impl WalkingConfig {
    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<RouteDto>,
}

#[derive(Debug, Deserialize)]
struct RouteDto {
    distance: f64,
    duration: f64,
    geometry: GeometryDto,
}

#[derive(Debug, Deserialize)]
struct GeometryDto {
    /// `[lon, lat]` pairs.
    coordinates: Vec<[f64; 2]>,
}

/// Parse a `/route` response body. `NoRoute` and empty route lists are `None`.
pub fn parse_route(body: &str) -> Result<Option<WalkRoute>, WalkingError> {
    let response: RouteResponse = serde_json::from_str(body).map_err(|e| WalkingError::Json {
        message: e.to_string(),
    })?;

    if response.code != "Ok" {
        debug!(code = %response.code, "Router found no walking route");
        return Ok(None);
    }

    Ok(response.routes.into_iter().next().map(|route| WalkRoute {
        polyline: route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lon, lat]| LatLon::new(lat, lon))
            .collect(),
        distance_m: route.distance,
        duration_s: route.duration,
    }))
}

/// Walking router client.
///
/// Uses a semaphore to limit concurrent requests to the router.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
    profile: String,
    semaphore: Arc<Semaphore>,
}

impl OsrmClient {
    /// Create a new client with the given configuration.
    pub fn new(config: WalkingConfig) -> Result<Self, WalkingError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            profile: config.profile,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    fn route_url(&self, from: LatLon, to: LatLon) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url, self.profile, from.lon, from.lat, to.lon, to.lat
        )
    }
}

impl WalkingProvider for OsrmClient {
    async fn compute_walk(
        &self,
        from: LatLon,
        to: LatLon,
    ) -> Result<Option<WalkRoute>, WalkingError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| WalkingError::Closed)?;

        let url = self.route_url(from, to);
        trace!(%url, "Requesting walking route");

        let response = self
            .http
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(WalkingError::RateLimited);
        }

        let body = response.text().await?;

        // OSRM answers NoRoute with a 400 and a JSON body
        if !status.is_success() && !body.contains("\"code\"") {
            return Err(WalkingError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        parse_route(&body)
    }
}
