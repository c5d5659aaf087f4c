//! Nominatim-compatible reverse geocoding client.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::LatLon;

use super::PlaceResolver;
use super::error::PlaceError;

/// Default base URL for the public Nominatim instance.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Configuration for the geocoding client.
#[derive(Debug, Clone)]
pub struct PlacesConfig {
    /// Base URL of the geocoder
    pub base_url: String,
    /// Sent as `User-Agent`; public Nominatim rejects anonymous clients
    pub user_agent: String,
    /// Preferred response language
    pub language: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("bus-planner/", env!("CARGO_PKG_VERSION")).to_string(),
            language: "fr".to_string(),
            timeout_secs: 5,
        }
    }
}

impl PlacesConfig {
    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<AddressDto>,
}

#[derive(Debug, Deserialize)]
struct AddressDto {
    #[serde(default)]
    road: Option<String>,
    #[serde(default)]
    house_number: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
}

/// Pick a short label from a `/reverse` response body.
///
/// Preference: the feature's own name, then "number road, locality", then
/// the first two parts of the display name.
pub fn parse_place(body: &str) -> Result<Option<String>, PlaceError> {
    let response: ReverseResponse = serde_json::from_str(body).map_err(|e| PlaceError::Json {
        message: e.to_string(),
    })?;

    if let Some(name) = response.name.filter(|n| !n.trim().is_empty()) {
        return Ok(Some(name));
    }

    if let Some(address) = response.address {
        let locality = address.city.or(address.town).or(address.village);
        if let Some(road) = address.road {
            let street = match address.house_number {
                Some(number) => format!("{number} {road}"),
                None => road,
            };
            return Ok(Some(match locality {
                Some(locality) => format!("{street}, {locality}"),
                None => street,
            }));
        }
    }

    Ok(response.display_name.map(|d| {
        d.split(',')
            .map(str::trim)
            .take(2)
            .collect::<Vec<_>>()
            .join(", ")
    }))
}

/// Reverse geocoding client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl NominatimClient {
    /// Create a new client with the given configuration.
    pub fn new(config: PlacesConfig) -> Result<Self, PlaceError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| PlaceError::Config("invalid user agent".to_string()))?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            language: config.language,
        })
    }

    /// Fetch the label for a point.
    pub async fn reverse(&self, point: LatLon) -> Result<Option<String>, PlaceError> {
        let url = format!("{}/reverse", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
                ("zoom", "18".to_string()),
                ("addressdetails", "1".to_string()),
                ("accept-language", self.language.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlaceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_place(&body)
    }
}

impl PlaceResolver for NominatimClient {
    async fn resolve(&self, point: LatLon) -> Option<String> {
        match self.reverse(point).await {
            Ok(label) => {
                debug!(lat = point.lat, lon = point.lon, ?label, "Resolved place");
                label
            }
            Err(error) => {
                warn!(%error, "Reverse geocoding failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = PlacesConfig::default();
        assert!(config.user_agent.starts_with("bus-planner/"));
        assert_eq!(config.language, "fr");

        let config = config.with_base_url("http://geo.local/").with_language("en");
        assert_eq!(config.base_url, "http://geo.local");
        assert_eq!(config.language, "en");
    }

    #[test]
    fn prefers_feature_name() {
        let body = r#"{"name": "Gare de Périgueux", "display_name": "Gare, Rue Denis Papin, Périgueux"}"#;
        assert_eq!(parse_place(body).unwrap().as_deref(), Some("Gare de Périgueux"));
    }

    #[test]
    fn builds_street_address() {
        let body = r#"{
            "name": "",
            "display_name": "12, Rue Taillefer, Périgueux, Dordogne",
            "address": {"house_number": "12", "road": "Rue Taillefer", "city": "Périgueux"}
        }"#;
        assert_eq!(
            parse_place(body).unwrap().as_deref(),
            Some("12 Rue Taillefer, Périgueux")
        );
    }

    #[test]
    fn falls_back_to_display_name() {
        let body = r#"{"display_name": "Boulazac, Boulazac Isle Manoire, Dordogne, France"}"#;
        assert_eq!(
            parse_place(body).unwrap().as_deref(),
            Some("Boulazac, Boulazac Isle Manoire")
        );
    }

    #[test]
    fn geocoder_error_body() {
        let body = r#"{"error": "Unable to geocode"}"#;
        assert_eq!(parse_place(body).unwrap(), None);
    }
}
