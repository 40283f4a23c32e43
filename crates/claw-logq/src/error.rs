//! Error types for log retrieval.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while retrieving or managing log files.
#[derive(Debug, Error)]
pub enum LogQueryError {
    /// The supplied credentials were rejected by the validator.
    #[error("unauthorized")]
    Unauthorized,

    /// The requested time window ends before it begins.
    #[error("invalid time range: end {end} precedes begin {begin}")]
    InvalidRange {
        /// Requested lower bound.
        begin: DateTime<Utc>,
        /// Requested upper bound.
        end: DateTime<Utc>,
    },

    /// Configuration rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A file could not be removed while purging the log directory.
    #[error("failed to remove {}: {source}", path.display())]
    Purge {
        /// The file that could not be removed.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The active log file could not be rotated.
    #[error("rotation failed: {0}")]
    Rotation(String),
}

/// Result type alias for log retrieval operations.
pub type Result<T> = std::result::Result<T, LogQueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = LogQueryError::Unauthorized;
        assert_eq!(err.to_string(), "unauthorized");

        let err = LogQueryError::InvalidConfig("max_records must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: max_records must be at least 1"
        );

        let err = LogQueryError::Rotation("disk full".to_string());
        assert_eq!(err.to_string(), "rotation failed: disk full");
    }

    #[test]
    fn error_invalid_range_mentions_both_bounds() {
        let begin = DateTime::from_timestamp(1_700_000_100, 0).unwrap_or_default();
        let end = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        let msg = LogQueryError::InvalidRange { begin, end }.to_string();
        assert!(msg.contains("2023-11-14T22:15:00"));
        assert!(msg.contains("2023-11-14T22:13:20"));
    }

    #[test]
    fn error_purge_includes_path() {
        let err = LogQueryError::Purge {
            path: PathBuf::from("/var/log/app-2024-01-01T00-00-00.000.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("app-2024-01-01T00-00-00.000.log"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn error_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LogQueryError = io_err.into();
        assert!(matches!(err, LogQueryError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn error_from_serde() {
        let serde_err = serde_json::from_str::<i32>("invalid");
        assert!(serde_err.is_err());
        if let Err(e) = serde_err {
            let err = LogQueryError::from(e);
            assert!(matches!(err, LogQueryError::Serialization(_)));
        }
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LogQueryError>();
    }
}
