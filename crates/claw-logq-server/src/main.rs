//! Clawbernetes log query server binary.
//!
//! Writes the process's own logs into the rotating log directory and serves
//! retrieval, listing and purge over HTTP.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use claw_logq::{LogQueryEngine, RecordLayer, RotatingWriter, SimpleValidator, Validator};
use claw_logq_server::{Cli, LogServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let writer = match RotatingWriter::new(cli.writer_config()) {
        Ok(writer) => Arc::new(writer),
        Err(e) => {
            eprintln!("Failed to open log directory {}: {e}", cli.dir.display());
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(RecordLayer::new(Arc::clone(&writer)))
        .init();

    let validator: Arc<dyn Validator> = if let Some(keys) = cli.keys() {
        Arc::new(SimpleValidator::new(keys))
    } else {
        let (validator, keys) = SimpleValidator::generate();
        // Printed rather than logged so the secret never lands in the log files.
        println!("Generated API key: {}", keys.api_key());
        println!("Generated API secret: {}", keys.api_secret());
        Arc::new(validator)
    };

    let engine = match LogQueryEngine::new(cli.query_config(), validator) {
        Ok(engine) => Arc::new(engine.with_rotator(writer)),
        Err(e) => {
            error!(error = %e, "invalid log query configuration");
            return ExitCode::FAILURE;
        }
    };

    let server = match LogServer::new(cli.server_config(), engine) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "invalid server configuration");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(dir = %cli.dir.display(), bind = %cli.bind, "starting log query server");
    match runtime.block_on(server.serve_with_shutdown(shutdown_signal())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "log server failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
