//! Capability traits implemented outside the retrieval engine.

use crate::error::Result;

/// Something that can close the active log file and start a new one.
///
/// Purging rotates first so that buffered writes land in a closed file that
/// the purge can see and remove.
pub trait Rotate: Send + Sync {
    /// Rotates the active log file.
    ///
    /// # Errors
    ///
    /// Returns an error if rotation fails.
    fn rotate(&self) -> Result<()>;
}
