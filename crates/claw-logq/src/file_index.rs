//! Enumeration of the log files in a directory.
//!
//! A log directory holds one current file (for example `app.log`) and any
//! number of rotations of it named `app-YYYY-MM-DDTHH-MM-SS.mmm.log`. The
//! embedded UTC timestamp is the instant the file was rotated, so every record
//! in a rotated file was written at or before it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{trace, warn};

use crate::config::validate_file_name;
use crate::error::{LogQueryError, Result};

/// `strftime` layout of the timestamp embedded in rotated file names.
pub const ROTATION_STAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// A log file found in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFile {
    /// File name inside the directory.
    pub name: String,
    /// Full path to the file.
    #[serde(skip)]
    pub path: PathBuf,
    /// Rotation instant; `None` for the current file.
    pub rotated_at: Option<DateTime<Utc>>,
    /// Size in bytes when the directory was listed.
    pub size: u64,
}

impl LogFile {
    /// Returns true for the actively appended file.
    #[must_use]
    pub const fn is_current(&self) -> bool {
        self.rotated_at.is_none()
    }
}

/// Lists a log directory in chronological order.
///
/// Nothing is cached: every call re-reads the directory.
#[derive(Debug, Clone)]
pub struct FileIndex {
    directory: PathBuf,
    current_file_name: String,
    stem: String,
    extension: String,
    rotated_pattern: Regex,
}

impl FileIndex {
    /// Creates an index for `current_file_name` inside `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`LogQueryError::InvalidConfig`] if the file name is unusable.
    pub fn new(directory: impl Into<PathBuf>, current_file_name: impl Into<String>) -> Result<Self> {
        let current_file_name = current_file_name.into();
        validate_file_name(&current_file_name)?;

        let (stem, extension) = match current_file_name.rfind('.') {
            Some(dot) if dot > 0 => (
                current_file_name[..dot].to_string(),
                current_file_name[dot..].to_string(),
            ),
            _ => (current_file_name.clone(), String::new()),
        };

        let pattern = format!(
            r"^{}-(\d{{4}}-\d{{2}}-\d{{2}}T\d{{2}}-\d{{2}}-\d{{2}}\.\d{{3}}){}$",
            regex::escape(&stem),
            regex::escape(&extension)
        );
        let rotated_pattern =
            Regex::new(&pattern).map_err(|e| LogQueryError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            directory: directory.into(),
            current_file_name,
            stem,
            extension,
            rotated_pattern,
        })
    }

    /// Returns the indexed directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the name of the current file.
    #[must_use]
    pub fn current_file_name(&self) -> &str {
        &self.current_file_name
    }

    /// Returns the full path of the current file.
    #[must_use]
    pub fn current_path(&self) -> PathBuf {
        self.directory.join(&self.current_file_name)
    }

    /// Builds the file name a rotation at `at` produces.
    ///
    /// Sub-millisecond precision is dropped.
    #[must_use]
    pub fn rotated_file_name(&self, at: DateTime<Utc>) -> String {
        format!(
            "{}-{}{}",
            self.stem,
            at.format(ROTATION_STAMP_FORMAT),
            self.extension
        )
    }

    /// Extracts the rotation instant from a rotated file name.
    ///
    /// Returns `None` for the current file and for unrelated names.
    #[must_use]
    pub fn rotation_timestamp(&self, file_name: &str) -> Option<DateTime<Utc>> {
        let captures = self.rotated_pattern.captures(file_name)?;
        let stamp = captures.get(1)?.as_str();
        NaiveDateTime::parse_from_str(stamp, ROTATION_STAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Lists the log files: rotated files ascending by rotation instant, then
    /// the current file last.
    ///
    /// Subdirectories and files that are neither the current file nor one of
    /// its rotations are left out. A directory that cannot be read is logged
    /// and yields an empty list.
    #[must_use]
    pub fn list(&self) -> Vec<LogFile> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    directory = %self.directory.display(),
                    error = %e,
                    "failed to list log directory"
                );
                return Vec::new();
            }
        };

        let mut rotated = Vec::new();
        let mut current = None;

        for entry in entries.filter_map(std::result::Result::ok) {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

            if name == self.current_file_name {
                current = Some(LogFile {
                    name,
                    path: entry.path(),
                    rotated_at: None,
                    size,
                });
            } else if let Some(rotated_at) = self.rotation_timestamp(&name) {
                rotated.push(LogFile {
                    name,
                    path: entry.path(),
                    rotated_at: Some(rotated_at),
                    size,
                });
            } else {
                trace!(file = %name, "ignoring unrelated file in log directory");
            }
        }

        rotated.sort_by(|a, b| a.rotated_at.cmp(&b.rotated_at).then_with(|| a.name.cmp(&b.name)));
        rotated.extend(current);
        rotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).expect("write file");
    }

    #[test]
    fn rotated_name_matches_convention() {
        let index = FileIndex::new("logs", "app.log").expect("index");
        let at = Utc
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("valid time")
            + chrono::Duration::milliseconds(42);
        assert_eq!(
            index.rotated_file_name(at),
            "app-2024-03-09T07-05-01.042.log"
        );
    }

    #[test]
    fn rotation_timestamp_roundtrip() {
        let index = FileIndex::new("logs", "app.log").expect("index");
        let at = Utc
            .with_ymd_and_hms(2023, 12, 31, 23, 59, 59)
            .single()
            .expect("valid time")
            + chrono::Duration::milliseconds(999);
        let name = index.rotated_file_name(at);
        assert_eq!(index.rotation_timestamp(&name), Some(at));
    }

    #[test]
    fn rotation_timestamp_rejects_other_names() {
        let index = FileIndex::new("logs", "app.log").expect("index");
        assert_eq!(index.rotation_timestamp("app.log"), None);
        assert_eq!(index.rotation_timestamp("app-2024-01-01T00-00-00.log"), None);
        assert_eq!(
            index.rotation_timestamp("other-2024-01-01T00-00-00.000.log"),
            None
        );
        assert_eq!(
            index.rotation_timestamp("app-2024-01-01T00-00-00.000.log.gz"),
            None
        );
        assert_eq!(
            index.rotation_timestamp("app-2024-13-01T00-00-00.000.log"),
            None
        );
    }

    #[test]
    fn file_name_without_extension() {
        let index = FileIndex::new("logs", "service").expect("index");
        let at = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid time");
        let name = index.rotated_file_name(at);
        assert_eq!(name, "service-2024-01-01T00-00-00.000");
        assert_eq!(index.rotation_timestamp(&name), Some(at));
    }

    #[test]
    fn list_orders_rotations_then_current() {
        let temp = TempDir::new().expect("temp dir");
        touch(temp.path(), "app.log", "");
        touch(temp.path(), "app-2024-02-01T00-00-00.000.log", "b");
        touch(temp.path(), "app-2024-01-01T00-00-00.000.log", "a");
        touch(temp.path(), "app-2024-01-15T12-30-00.500.log", "ab");

        let index = FileIndex::new(temp.path(), "app.log").expect("index");
        let names: Vec<String> = index.list().into_iter().map(|f| f.name).collect();

        assert_eq!(
            names,
            vec![
                "app-2024-01-01T00-00-00.000.log",
                "app-2024-01-15T12-30-00.500.log",
                "app-2024-02-01T00-00-00.000.log",
                "app.log",
            ]
        );
    }

    #[test]
    fn list_marks_only_current_file_as_current() {
        let temp = TempDir::new().expect("temp dir");
        touch(temp.path(), "app.log", "xyz");
        touch(temp.path(), "app-2024-01-01T00-00-00.000.log", "");

        let index = FileIndex::new(temp.path(), "app.log").expect("index");
        let files = index.list();

        assert_eq!(files.len(), 2);
        assert!(!files[0].is_current());
        assert!(files[1].is_current());
        assert_eq!(files[1].size, 3);
        assert_eq!(files[1].path, temp.path().join("app.log"));
    }

    #[test]
    fn list_skips_unrelated_entries() {
        let temp = TempDir::new().expect("temp dir");
        touch(temp.path(), "notes.txt", "");
        touch(temp.path(), "app-2024-01-01T00-00-00.000.log.gz", "");
        fs::create_dir(temp.path().join("archive")).expect("mkdir");

        let index = FileIndex::new(temp.path(), "app.log").expect("index");
        assert!(index.list().is_empty());
    }

    #[test]
    fn list_missing_directory_is_empty() {
        let temp = TempDir::new().expect("temp dir");
        let index = FileIndex::new(temp.path().join("missing"), "app.log").expect("index");
        assert!(index.list().is_empty());
    }

    #[test]
    fn new_rejects_path_in_file_name() {
        assert!(FileIndex::new("logs", "sub/app.log").is_err());
        assert!(FileIndex::new("logs", "").is_err());
    }
}
