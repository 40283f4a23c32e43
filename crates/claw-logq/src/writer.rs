//! Size-based rotating writer for JSON-lines log files.
//!
//! This module provides:
//! - [`RotatingWriterConfig`] — Where and how large the log files get
//! - [`RotatingWriter`] — Appends [`LogRecord`]s and rotates the active file
//!
//! Rotated files are named after the instant they were closed, rounded up to
//! the millisecond, so every record inside one is at or before its timestamp.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::{DEFAULT_DIRECTORY, DEFAULT_FILE_NAME, validate_file_name};
use crate::error::{LogQueryError, Result};
use crate::file_index::FileIndex;
use crate::traits::Rotate;
use crate::types::LogRecord;

/// Default size of the active file before it is rotated (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for a [`RotatingWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatingWriterConfig {
    /// Directory holding the active file and its rotations.
    pub directory: PathBuf,
    /// Name of the active file.
    pub file_name: String,
    /// Maximum size of the active file before rotation (bytes).
    pub max_file_size: u64,
    /// Number of rotated files to keep; `None` keeps all of them.
    pub max_backups: Option<usize>,
}

impl Default for RotatingWriterConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            file_name: DEFAULT_FILE_NAME.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_backups: None,
        }
    }
}

impl RotatingWriterConfig {
    /// Creates a new config with the given directory.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    /// Sets the active file name.
    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Sets the max file size for rotation.
    #[must_use]
    pub const fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Sets how many rotated files are kept.
    #[must_use]
    pub const fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = Some(count);
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LogQueryError::InvalidConfig`] if the file name is unusable
    /// or `max_file_size` is zero.
    pub fn validate(&self) -> Result<()> {
        validate_file_name(&self.file_name)?;
        if self.max_file_size == 0 {
            return Err(LogQueryError::InvalidConfig(
                "max_file_size must be at least 1 byte".to_string(),
            ));
        }
        Ok(())
    }
}

struct WriterState {
    file: File,
    size: u64,
    /// Latest record time written to the active file.
    latest: Option<DateTime<Utc>>,
    /// Timestamp of the newest rotated file.
    last_stamp: Option<DateTime<Utc>>,
}

/// What a rotation did, reported once the writer lock is released.
#[derive(Default)]
struct RotationOutcome {
    rotated_to: Option<String>,
    pruned: Vec<String>,
    prune_failures: Vec<(PathBuf, std::io::Error)>,
}

impl RotationOutcome {
    fn log(self) {
        if let Some(name) = self.rotated_to {
            debug!(file = %name, pruned = self.pruned.len(), "rotated log file");
        }
        for (path, e) in self.prune_failures {
            warn!(path = %path.display(), error = %e, "failed to remove old log file");
        }
    }
}

/// Appends records to `<directory>/<file_name>` and rotates it by size.
///
/// Appends and rotations are serialized by one lock. Nothing is logged while
/// it is held, so the writer can back a tracing layer.
pub struct RotatingWriter {
    config: RotatingWriterConfig,
    index: FileIndex,
    state: Mutex<WriterState>,
}

impl RotatingWriter {
    /// Creates the writer, creating the directory and opening the active file
    /// for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the file cannot be opened.
    pub fn new(config: RotatingWriterConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.directory)?;

        let index = FileIndex::new(config.directory.clone(), config.file_name.clone())?;
        let file = open_active(&index.current_path())?;
        let size = file.metadata()?.len();
        let last_stamp = index.list().iter().filter_map(|f| f.rotated_at).max();

        Ok(Self {
            config,
            index,
            state: Mutex::new(WriterState {
                file,
                size,
                latest: None,
                last_stamp,
            }),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RotatingWriterConfig {
        &self.config
    }

    /// Returns the index over the writer's directory.
    #[must_use]
    pub const fn index(&self) -> &FileIndex {
        &self.index
    }

    /// Returns the size of the active file in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.state.lock().size
    }

    /// Appends a record stamped by the caller.
    ///
    /// Records must be appended in non-decreasing time order.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let line = record.to_line()?;
        let mut state = self.state.lock();
        let outcome = self.write_locked(&mut state, &line, record.time);
        drop(state);
        outcome.map(RotationOutcome::log)
    }

    /// Builds a record from the current time and appends it.
    ///
    /// The time is taken under the writer lock, so records appended this way
    /// are in order within each file.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    pub fn append_with<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce(DateTime<Utc>) -> LogRecord,
    {
        let mut state = self.state.lock();
        let record = build(Utc::now());
        let line = record.to_line()?;
        let outcome = self.write_locked(&mut state, &line, record.time);
        drop(state);
        outcome.map(RotationOutcome::log)
    }

    /// Closes the active file under a timestamped name and starts a new one.
    ///
    /// An empty active file is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`LogQueryError::Rotation`] if the file cannot be renamed, or
    /// an I/O error if the new active file cannot be opened.
    pub fn rotate(&self) -> Result<()> {
        let mut state = self.state.lock();
        let outcome = self.rotate_locked(&mut state);
        drop(state);
        outcome.map(RotationOutcome::log)
    }

    fn write_locked(
        &self,
        state: &mut WriterState,
        line: &str,
        time: DateTime<Utc>,
    ) -> Result<RotationOutcome> {
        let len = line.len() as u64;
        let outcome = if state.size > 0 && state.size + len > self.config.max_file_size {
            self.rotate_locked(state)?
        } else {
            RotationOutcome::default()
        };

        state.file.write_all(line.as_bytes())?;
        state.file.flush()?;
        state.size += len;
        state.latest = Some(state.latest.map_or(time, |latest| latest.max(time)));
        Ok(outcome)
    }

    fn rotate_locked(&self, state: &mut WriterState) -> Result<RotationOutcome> {
        if state.size == 0 {
            return Ok(RotationOutcome::default());
        }

        let now = Utc::now();
        let mut stamp = ceil_to_millis(state.latest.map_or(now, |latest| latest.max(now)));
        if let Some(last) = state.last_stamp {
            if stamp <= last {
                stamp = last + TimeDelta::milliseconds(1);
            }
        }
        let mut name = self.index.rotated_file_name(stamp);
        while self.index.directory().join(&name).exists() {
            stamp += TimeDelta::milliseconds(1);
            name = self.index.rotated_file_name(stamp);
        }

        let current = self.index.current_path();
        let rotated = self.index.directory().join(&name);
        fs::rename(&current, &rotated).map_err(|e| {
            LogQueryError::Rotation(format!(
                "rename {} to {}: {e}",
                current.display(),
                rotated.display()
            ))
        })?;

        state.file = open_active(&current)?;
        state.size = 0;
        state.latest = None;
        state.last_stamp = Some(stamp);

        let mut outcome = RotationOutcome {
            rotated_to: Some(name),
            ..Default::default()
        };
        if let Some(keep) = self.config.max_backups {
            self.prune(keep, &mut outcome);
        }
        Ok(outcome)
    }

    fn prune(&self, keep: usize, outcome: &mut RotationOutcome) {
        let rotated: Vec<_> = self
            .index
            .list()
            .into_iter()
            .filter(|f| !f.is_current())
            .collect();
        let excess = rotated.len().saturating_sub(keep);

        for file in rotated.into_iter().take(excess) {
            match fs::remove_file(&file.path) {
                Ok(()) => outcome.pruned.push(file.name),
                Err(e) => outcome.prune_failures.push((file.path, e)),
            }
        }
    }
}

impl Rotate for RotatingWriter {
    fn rotate(&self) -> Result<()> {
        Self::rotate(self)
    }
}

impl std::fmt::Debug for RotatingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingWriter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn open_active(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

fn ceil_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    let sub_millis = at.timestamp_subsec_nanos() % 1_000_000;
    if sub_millis == 0 {
        at
    } else {
        at + TimeDelta::nanoseconds(i64::from(1_000_000 - sub_millis))
    }
}
