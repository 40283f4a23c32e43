//! Engine configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LogQueryError, Result};

/// Default directory holding the log files.
pub const DEFAULT_DIRECTORY: &str = "logs";

/// Default name of the actively appended file.
pub const DEFAULT_FILE_NAME: &str = "app.log";

/// Default maximum number of records returned per retrieval.
pub const DEFAULT_MAX_RECORDS: usize = 500;

/// Configuration for a [`LogQueryEngine`](crate::LogQueryEngine).
///
/// Fixed when the engine is built and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQueryConfig {
    /// Directory containing the current file and its rotations.
    pub directory: PathBuf,
    /// Name of the actively appended file inside `directory`.
    pub current_file_name: String,
    /// Maximum number of records a single retrieval may return.
    pub max_records: usize,
}

impl Default for LogQueryConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            current_file_name: DEFAULT_FILE_NAME.to_string(),
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

impl LogQueryConfig {
    /// Creates a config for the given directory.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    /// Sets the current file name.
    #[must_use]
    pub fn with_current_file_name(mut self, name: impl Into<String>) -> Self {
        self.current_file_name = name.into();
        self
    }

    /// Sets the per-request record cap.
    #[must_use]
    pub const fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    /// Checks the configuration for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`LogQueryError::InvalidConfig`] if the file name is empty or
    /// contains a path separator, or if `max_records` is zero.
    pub fn validate(&self) -> Result<()> {
        validate_file_name(&self.current_file_name)?;
        if self.max_records == 0 {
            return Err(LogQueryError::InvalidConfig(
                "max_records must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(LogQueryError::InvalidConfig(
            "current file name cannot be empty".to_string(),
        ));
    }
    if name.contains(['/', '\\']) {
        return Err(LogQueryError::InvalidConfig(format!(
            "current file name must not contain a path separator: {name}"
        )));
    }
    Ok(())
}
