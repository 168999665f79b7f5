//! Server configuration, read from command-line flags with environment
//! variable fallbacks.

use clap::Parser;

use crate::{DEFAULT_HOST, DEFAULT_PORT};

/// MiniKV - a minimal in-memory key-value store speaking RESP.
#[derive(Debug, Clone, Parser)]
#[command(name = "minikv", version, about, long_about = None)]
pub struct Config {
    /// Host to bind to
    #[arg(short = 'H', long, env = "MINIKV_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "MINIKV_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Log filter used when RUST_LOG is not set (e.g. "info", "minikv=debug")
    #[arg(long, env = "MINIKV_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Returns the bind address as `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
