//! Shared state for the log server.

use std::sync::Arc;

use axum::http::HeaderName;
use claw_logq::LogQueryEngine;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// State shared by every request handler.
#[derive(Debug)]
pub struct AppState {
    config: ServerConfig,
    engine: Arc<LogQueryEngine>,
    transaction_id_header: HeaderName,
}

impl AppState {
    /// Create the state, validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidConfig`] if the endpoint or the
    /// transaction id header name is invalid.
    pub fn new(config: ServerConfig, engine: Arc<LogQueryEngine>) -> ServerResult<Self> {
        config.validate()?;
        let transaction_id_header = HeaderName::from_bytes(
            config.transaction_id_header.to_ascii_lowercase().as_bytes(),
        )
        .map_err(|e| {
            ServerError::InvalidConfig(format!(
                "invalid transaction id header {:?}: {e}",
                config.transaction_id_header
            ))
        })?;

        Ok(Self {
            config,
            engine,
            transaction_id_header,
        })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a handle to the retrieval engine.
    #[must_use]
    pub fn engine(&self) -> Arc<LogQueryEngine> {
        Arc::clone(&self.engine)
    }

    /// Get the parsed transaction id header name.
    #[must_use]
    pub const fn transaction_id_header(&self) -> &HeaderName {
        &self.transaction_id_header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claw_logq::{Keys, LogQueryConfig};

    fn engine() -> Arc<LogQueryEngine> {
        Arc::new(
            LogQueryEngine::new(LogQueryConfig::default(), Arc::new(|_: &Keys| true))
                .expect("engine"),
        )
    }

    #[test]
    fn header_name_is_normalized() {
        let config = ServerConfig::default().with_transaction_id_header("X-Request-Id");
        let state = AppState::new(config, engine()).expect("state");
        assert_eq!(state.transaction_id_header().as_str(), "x-request-id");
    }

    #[test]
    fn rejects_invalid_header_name() {
        let config = ServerConfig::default().with_transaction_id_header("bad header");
        assert!(matches!(
            AppState::new(config, engine()),
            Err(ServerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let config = ServerConfig::default().with_endpoint("logs");
        assert!(AppState::new(config, engine()).is_err());
    }
}
