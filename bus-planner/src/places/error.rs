//! Reverse geocoding error types.

/// Errors that can occur when resolving a place name.
#[derive(Debug, thiserror::Error)]
pub enum PlaceError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Geocoder returned an error status
    #[error("geocoder error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}
