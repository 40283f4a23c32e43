//! Removal of every log file but the current one.

use std::fs;

use serde::Serialize;
use tracing::{error, info};

use crate::error::{LogQueryError, Result};
use crate::file_index::FileIndex;
use crate::traits::Rotate;

/// Outcome of a successful purge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// Names of the removed files, sorted.
    pub removed: Vec<String>,
}

/// Rotates the active file through `rotator`, then deletes every file in the
/// directory except the current one. Subdirectories are left alone.
///
/// # Errors
///
/// Returns an error if rotation fails, if the directory cannot be listed, or
/// on the first file that cannot be removed. Files removed before a failure
/// stay removed.
pub fn purge(index: &FileIndex, rotator: Option<&dyn Rotate>) -> Result<PurgeReport> {
    if let Some(rotator) = rotator {
        rotator.rotate()?;
    }

    let directory = index.directory();
    let entries = fs::read_dir(directory).map_err(|e| {
        error!(directory = %directory.display(), error = %e, "failed to list log directory for purge");
        LogQueryError::Io(e)
    })?;

    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if name == index.current_file_name() {
            continue;
        }

        let path = entry.path();
        fs::remove_file(&path).map_err(|source| LogQueryError::Purge {
            path: path.clone(),
            source,
        })?;
        removed.push(name.to_string_lossy().into_owned());
    }

    removed.sort();
    info!(directory = %directory.display(), removed = removed.len(), "purged log directory");
    Ok(PurgeReport { removed })
}
