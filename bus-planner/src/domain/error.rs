//! Domain error types.
//!
//! These errors represent validation failures in feed records and search
//! inputs. They are distinct from I/O and HTTP errors.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A time string could not be parsed
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// Search mode is neither depart nor arrive
    #[error("invalid search mode: {0}")]
    InvalidMode(String),

    /// Window start is after its end
    #[error("invalid window: start {start} is after end {end}")]
    InvalidWindow { start: i64, end: i64 },

    /// A record is missing its identifier
    #[error("{0} record has an empty id")]
    EmptyId(&'static str),

    /// A trip needs at least two stop times to be ridden
    #[error("trip {trip_id} has {count} stop times, at least 2 required")]
    TooFewStopTimes { trip_id: String, count: usize },

    /// Stop sequences within a trip must be strictly increasing
    #[error("trip {trip_id}: stop sequence {current} does not follow {previous}")]
    NonMonotonicSequence {
        trip_id: String,
        previous: u32,
        current: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidTime("8h15".into());
        assert_eq!(err.to_string(), "invalid time: 8h15");

        let err = DomainError::EmptyId("stop");
        assert_eq!(err.to_string(), "stop record has an empty id");

        let err = DomainError::TooFewStopTimes {
            trip_id: "T1".into(),
            count: 1,
        };
        assert_eq!(
            err.to_string(),
            "trip T1 has 1 stop times, at least 2 required"
        );

        let err = DomainError::NonMonotonicSequence {
            trip_id: "T1".into(),
            previous: 4,
            current: 4,
        };
        assert_eq!(err.to_string(), "trip T1: stop sequence 4 does not follow 4");
    }
}
