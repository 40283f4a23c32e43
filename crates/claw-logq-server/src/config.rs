//! Server configuration.

use std::net::SocketAddr;

use crate::error::{ServerError, ServerResult};

/// Default path the retrieval and purge routes are mounted on.
pub const DEFAULT_ENDPOINT: &str = "/logs";

/// Default header carrying the caller's transaction id.
pub const DEFAULT_TRANSACTION_ID_HEADER: &str = "x-transaction-id";

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// Path of the log routes (`POST` retrieves, `DELETE` purges).
    pub endpoint: String,
    /// Request and response header carrying the transaction id.
    pub transaction_id_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            transaction_id_header: DEFAULT_TRANSACTION_ID_HEADER.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }

    /// Set the log routes path.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the transaction id header name.
    #[must_use]
    pub fn with_transaction_id_header(mut self, header: impl Into<String>) -> Self {
        self.transaction_id_header = header.into();
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidConfig`] if the endpoint is not an
    /// absolute path below the root or collides with the health route.
    pub fn validate(&self) -> ServerResult<()> {
        let endpoint = self.endpoint.as_str();
        if !endpoint.starts_with('/') || endpoint.len() < 2 || endpoint.ends_with('/') {
            return Err(ServerError::InvalidConfig(format!(
                "endpoint must look like /path, got {endpoint:?}"
            )));
        }
        if endpoint == "/health" {
            return Err(ServerError::InvalidConfig(
                "endpoint /health is reserved".to_string(),
            ));
        }
        Ok(())
    }
}
