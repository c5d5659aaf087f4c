//! Feed loading error types.

use std::path::PathBuf;

/// Errors that can occur while reading a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A required table is absent from the feed directory
    #[error("required feed file missing: {0}")]
    MissingFile(&'static str),

    /// A required column is absent from a table header
    #[error("{file}: required column '{column}' missing")]
    MissingColumn {
        file: &'static str,
        column: &'static str,
    },

    /// The file could not be opened or read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV header could not be parsed
    #[error("{file}: CSV error: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FeedError::MissingFile("stops.txt");
        assert_eq!(err.to_string(), "required feed file missing: stops.txt");

        let err = FeedError::MissingColumn {
            file: "trips.txt",
            column: "trip_id",
        };
        assert_eq!(err.to_string(), "trips.txt: required column 'trip_id' missing");
    }
}
