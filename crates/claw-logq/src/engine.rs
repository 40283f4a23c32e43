//! The retrieval engine handle.
//!
//! [`LogQueryEngine`] bundles the configuration, the credential validator and
//! the rotation capability for one log directory. Several engines can run side
//! by side, one per directory.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::aggregate;
use crate::auth::{Keys, Validator};
use crate::config::LogQueryConfig;
use crate::error::{LogQueryError, Result};
use crate::file_index::{FileIndex, LogFile};
use crate::purge::{self, PurgeReport};
use crate::traits::Rotate;
use crate::types::{RetrievalRequest, RetrievalResult};

/// Retrieval, listing and purge over one log directory.
///
/// Retrievals and listings share the directory; a purge holds it exclusively
/// so it never deletes a file another request of this engine is reading.
pub struct LogQueryEngine {
    config: LogQueryConfig,
    index: FileIndex,
    validator: Arc<dyn Validator>,
    rotator: Option<Arc<dyn Rotate>>,
    directory_lock: RwLock<()>,
}

impl LogQueryEngine {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns [`LogQueryError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: LogQueryConfig, validator: Arc<dyn Validator>) -> Result<Self> {
        config.validate()?;
        let index = FileIndex::new(config.directory.clone(), config.current_file_name.clone())?;
        Ok(Self {
            config,
            index,
            validator,
            rotator: None,
            directory_lock: RwLock::new(()),
        })
    }

    /// Sets the capability used to rotate the active file before a purge.
    #[must_use]
    pub fn with_rotator(mut self, rotator: Arc<dyn Rotate>) -> Self {
        self.rotator = Some(rotator);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &LogQueryConfig {
        &self.config
    }

    /// Returns the file index.
    #[must_use]
    pub const fn index(&self) -> &FileIndex {
        &self.index
    }

    /// Returns the records matching `request`, oldest first, capped at the
    /// configured maximum.
    ///
    /// # Errors
    ///
    /// Returns [`LogQueryError::Unauthorized`] if `keys` are rejected, or
    /// [`LogQueryError::InvalidRange`] if the window is inverted.
    pub fn retrieve(&self, keys: &Keys, request: &RetrievalRequest) -> Result<RetrievalResult> {
        self.authorize(keys)?;
        request.validate()?;

        let _shared = self.directory_lock.read();
        let result = aggregate::retrieve(&self.index, request, self.config.max_records);
        debug!(
            records = result.len(),
            truncated = result.truncated,
            "retrieval complete"
        );
        Ok(result)
    }

    /// Lists the log files, rotated files first and the current file last.
    ///
    /// # Errors
    ///
    /// Returns [`LogQueryError::Unauthorized`] if `keys` are rejected.
    pub fn list_files(&self, keys: &Keys) -> Result<Vec<LogFile>> {
        self.authorize(keys)?;
        let _shared = self.directory_lock.read();
        Ok(self.index.list())
    }

    /// Rotates the active file and removes every other file in the directory.
    ///
    /// # Errors
    ///
    /// Returns [`LogQueryError::Unauthorized`] if `keys` are rejected, and any
    /// error from [`purge::purge`].
    pub fn purge(&self, keys: &Keys) -> Result<PurgeReport> {
        self.authorize(keys)?;
        let _exclusive = self.directory_lock.write();
        purge::purge(&self.index, self.rotator.as_deref())
    }

    /// Checks `keys` against the validator without doing any work.
    ///
    /// # Errors
    ///
    /// Returns [`LogQueryError::Unauthorized`] if `keys` are rejected.
    pub fn authorize(&self, keys: &Keys) -> Result<()> {
        if self.validator.validate(keys) {
            Ok(())
        } else {
            warn!(api_key = %keys.api_key(), "rejected log access");
            Err(LogQueryError::Unauthorized)
        }
    }
}

impl fmt::Debug for LogQueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogQueryEngine")
            .field("config", &self.config)
            .field("rotator", &self.rotator.is_some())
            .finish_non_exhaustive()
    }
}
