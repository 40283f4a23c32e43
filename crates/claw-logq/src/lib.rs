//! # claw-logq
//!
//! Time-window retrieval over rotated JSON-lines log files.
//!
//! A log directory holds one active file plus its rotations, each a sequence
//! of [`LogRecord`] lines in time order. Retrieval binary-searches every file
//! for the start of the requested window, then scans forward under a record
//! cap shared across files.
//!
//! This crate provides:
//!
//! - [`LogQueryEngine`] — Authorized retrieval, listing and purge for one directory
//! - [`LogRecord`] — One JSON line of a log file
//! - [`Query`] / [`QueryOp`] — Field predicates (`eq`, `sw`, `ew`, `co`)
//! - [`RetrievalRequest`] / [`RetrievalResult`] — Window, filters and results
//! - [`FileIndex`] — Chronological listing of the current file and its rotations
//! - [`RotatingWriter`] — Size-based rotating writer producing such directories
//! - [`RecordLayer`] — `tracing` layer writing events through a [`RotatingWriter`]
//! - [`Validator`] / [`SimpleValidator`] — Credential checks guarding the engine
//!
//! ## Example
//!
//! ```rust
//! use claw_logq::{LogRecord, Query, RetrievalRequest, query};
//! use chrono::{TimeZone, Utc};
//!
//! let begin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
//!
//! let request = RetrievalRequest::between(begin, end)
//!     .with_transaction_id("tx-42")
//!     .with_query(Query::starts_with("msg", "log 3"));
//! assert!(request.validate().is_ok());
//!
//! let record = LogRecord::new("info", begin, "log 3 written").with_transaction_id("tx-42");
//! assert!(query::evaluate(request.query.as_ref().unwrap(), &record));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod file_index;
pub mod locate;
pub mod purge;
pub mod query;
pub mod scan;
pub mod sink;
pub mod traits;
pub mod types;
pub mod writer;

// Re-export main types
pub use auth::{Keys, SimpleValidator, Validator};
pub use config::{DEFAULT_DIRECTORY, DEFAULT_FILE_NAME, DEFAULT_MAX_RECORDS, LogQueryConfig};
pub use engine::LogQueryEngine;
pub use error::{LogQueryError, Result};
pub use file_index::{FileIndex, LogFile};
pub use purge::PurgeReport;
pub use sink::RecordLayer;
pub use traits::Rotate;
pub use types::{
    LogRecord, Query, QueryOp, RetrievalRequest, RetrievalResponse, RetrievalResult,
};
pub use writer::{DEFAULT_MAX_FILE_SIZE, RotatingWriter, RotatingWriterConfig};
