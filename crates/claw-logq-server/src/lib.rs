//! # claw-logq-server
//!
//! HTTP front end for [`claw_logq`], built on axum.
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/health` | GET | Liveness check |
//! | `{endpoint}` | POST | Retrieve records in a time window |
//! | `{endpoint}` | DELETE | Rotate and purge all but the current file |
//! | `{endpoint}/files` | GET | List log files in chronological order |
//!
//! `{endpoint}` defaults to `/logs`. Log routes require the `x-api-key` and
//! `x-api-secret` headers. Every request carries a transaction id, taken from
//! the `x-transaction-id` header or generated, and echoed on the response.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use cli::Cli;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use routes::create_router;
pub use server::LogServer;
pub use state::AppState;
