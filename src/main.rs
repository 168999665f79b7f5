//! MiniKV server binary.
//!
//! Parses configuration, sets up logging, creates the shared stores and
//! serves RESP clients until Ctrl+C.

use anyhow::Context;
use clap::Parser;
use minikv::commands::CommandHandler;
use minikv::connection::{handle_connection, ConnectionStats};
use minikv::storage::{HashStore, StringStore};
use minikv::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(version = minikv::VERSION, "Starting MiniKV");

    // Shared by every connection for the lifetime of the process.
    let strings = Arc::new(StringStore::new());
    let hashes = Arc::new(HashStore::new());
    let handler = CommandHandler::new(strings, hashes);

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = accept_loop(listener, handler, Arc::clone(&stats)) => {}
        _ = shutdown => {}
    }

    let summary = stats.snapshot();
    info!(
        connections = summary.accepted,
        still_open = summary.active,
        commands = summary.commands,
        protocol_errors = summary.protocol_errors,
        bytes_in = summary.bytes_in,
        bytes_out = summary.bytes_out,
        "Server shutdown complete"
    );
    Ok(())
}

/// Accepts clients forever, spawning one task per connection.
async fn accept_loop(listener: TcpListener, handler: CommandHandler, stats: Arc<ConnectionStats>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = handler.clone();
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
