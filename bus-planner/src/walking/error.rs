//! Walking router error types.

/// Errors that can occur when asking the walking router for a route.
#[derive(Debug, thiserror::Error)]
pub enum WalkingError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Router returned an error status
    #[error("router error {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the router
    #[error("rate limited by walking router")]
    RateLimited,

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Request slots are no longer available
    #[error("walking client shut down")]
    Closed,
}
