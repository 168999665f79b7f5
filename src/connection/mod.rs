//! Connection Module
//!
//! Per-client network handling. The TCP listener in `main.rs` accepts
//! sockets and spawns one task per client running [`handle_connection`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener (main.rs)                  │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ accept() + spawn
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Connection                            │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read bytes  │───>│ Parse RESP  │───>│ Dispatch    │     │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘     │
//! │                                               ▼             │
//! │                                        ┌─────────────┐      │
//! │                                        │ Flush batch │      │
//! │                                        └─────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use minikv::commands::CommandHandler;
//! use minikv::connection::{handle_connection, ConnectionStats};
//! use minikv::storage::{HashStore, StringStore};
//! use std::sync::Arc;
//!
//! let handler = CommandHandler::new(Arc::new(StringStore::new()), Arc::new(HashStore::new()));
//! let stats = Arc::new(ConnectionStats::new());
//!
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, handler.clone(), stats));
//! ```

pub mod handler;

pub use handler::{
    handle_connection, Connection, ConnectionError, ConnectionStats, StatsSnapshot,
    MAX_REQUEST_SIZE,
};
