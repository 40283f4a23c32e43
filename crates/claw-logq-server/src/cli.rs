//! Command-line argument parsing with clap.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use claw_logq::{
    DEFAULT_DIRECTORY, DEFAULT_FILE_NAME, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_RECORDS, Keys,
    LogQueryConfig, RotatingWriterConfig,
};

use crate::config::{DEFAULT_ENDPOINT, DEFAULT_TRANSACTION_ID_HEADER, ServerConfig};

/// Serves time-window queries over a directory of rotated JSON log files.
#[derive(Parser, Debug, Clone)]
#[command(name = "claw-logq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "LOGQ_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Directory holding the log files.
    #[arg(long, env = "LOGQ_DIR", default_value = DEFAULT_DIRECTORY)]
    pub dir: PathBuf,

    /// Name of the active log file.
    #[arg(long, env = "LOGQ_FILE_NAME", default_value = DEFAULT_FILE_NAME)]
    pub file_name: String,

    /// Maximum records returned per retrieval.
    #[arg(long, env = "LOGQ_MAX_RECORDS", default_value_t = DEFAULT_MAX_RECORDS)]
    pub max_records: usize,

    /// Size in bytes at which the active file is rotated.
    #[arg(long, env = "LOGQ_MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Number of rotated files to keep (all when unset).
    #[arg(long, env = "LOGQ_MAX_BACKUPS")]
    pub max_backups: Option<usize>,

    /// Path of the log routes.
    #[arg(long, env = "LOGQ_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Header carrying the transaction id.
    #[arg(long, env = "LOGQ_TRANSACTION_HEADER", default_value = DEFAULT_TRANSACTION_ID_HEADER)]
    pub transaction_header: String,

    /// API key accepted by the server.
    #[arg(long, env = "LOGQ_API_KEY", requires = "api_secret")]
    pub api_key: Option<String>,

    /// API secret accepted by the server.
    #[arg(long, env = "LOGQ_API_SECRET", requires = "api_key", hide_env_values = true)]
    pub api_secret: Option<String>,
}

impl Cli {
    /// Builds the HTTP server configuration.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.bind)
            .with_endpoint(self.endpoint.clone())
            .with_transaction_id_header(self.transaction_header.clone())
    }

    /// Builds the retrieval engine configuration.
    #[must_use]
    pub fn query_config(&self) -> LogQueryConfig {
        LogQueryConfig::new(self.dir.clone())
            .with_current_file_name(self.file_name.clone())
            .with_max_records(self.max_records)
    }

    /// Builds the rotating writer configuration.
    #[must_use]
    pub fn writer_config(&self) -> RotatingWriterConfig {
        let config = RotatingWriterConfig::new(self.dir.clone())
            .with_file_name(self.file_name.clone())
            .with_max_file_size(self.max_file_size);
        match self.max_backups {
            Some(count) => config.with_max_backups(count),
            None => config,
        }
    }

    /// Returns the configured credentials, if both halves were given.
    #[must_use]
    pub fn keys(&self) -> Option<Keys> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => Some(Keys::new(key.clone(), secret.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["claw-logq"]).expect("parse");
        assert_eq!(cli.bind.port(), 8080);
        assert_eq!(cli.dir, PathBuf::from("logs"));
        assert_eq!(cli.file_name, "app.log");
        assert_eq!(cli.max_records, 500);
        assert_eq!(cli.max_backups, None);
        assert_eq!(cli.endpoint, "/logs");
        assert!(cli.keys().is_none());
    }

    #[test]
    fn builds_configs() {
        let cli = Cli::try_parse_from([
            "claw-logq",
            "--bind",
            "127.0.0.1:9090",
            "--dir",
            "/var/log/svc",
            "--file-name",
            "svc.log",
            "--max-records",
            "50",
            "--max-file-size",
            "4096",
            "--max-backups",
            "3",
            "--endpoint",
            "/api/logs",
            "--api-key",
            "k",
            "--api-secret",
            "s",
        ])
        .expect("parse");

        let server = cli.server_config();
        assert_eq!(server.bind_addr.port(), 9090);
        assert_eq!(server.endpoint, "/api/logs");

        let query = cli.query_config();
        assert_eq!(query.directory, PathBuf::from("/var/log/svc"));
        assert_eq!(query.current_file_name, "svc.log");
        assert_eq!(query.max_records, 50);

        let writer = cli.writer_config();
        assert_eq!(writer.file_name, "svc.log");
        assert_eq!(writer.max_file_size, 4096);
        assert_eq!(writer.max_backups, Some(3));

        let keys = cli.keys().expect("keys");
        assert_eq!(keys.api_key(), "k");
        assert_eq!(keys.api_secret(), "s");
    }

    #[test]
    fn key_without_secret_is_rejected() {
        assert!(Cli::try_parse_from(["claw-logq", "--api-key", "k"]).is_err());
    }
}
