//! # MiniKV - A Minimal In-Memory Key-Value Store
//!
//! MiniKV speaks the Redis protocol (RESP) and implements a small command
//! set: string get/set, multi-get, atomic increment/decrement, hash
//! get/set/get-all and a liveness probe.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             MiniKV                               │
//! │                                                                  │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────────┐       │
//! │  │ TCP Server  │───>│ Connection  │───>│ CommandHandler  │       │
//! │  │ (Listener)  │    │  Handler    │    │  + Registry     │       │
//! │  └─────────────┘    └──────┬──────┘    └────────┬────────┘       │
//! │                            │                    │                │
//! │                     ┌──────┴──────┐     ┌───────┴────────┐       │
//! │                     │ RESP Parser │     ▼                ▼       │
//! │                     └─────────────┘  StringStore     HashStore   │
//! │                                      (RwLock)        (RwLock)    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use minikv::commands::CommandHandler;
//! use minikv::protocol::RespValue;
//! use minikv::storage::{HashStore, StringStore};
//! use std::sync::Arc;
//!
//! let handler = CommandHandler::new(Arc::new(StringStore::new()), Arc::new(HashStore::new()));
//!
//! let reply = handler.dispatch("SET", &[RespValue::bulk_string("name"), RespValue::bulk_string("Ariz")]);
//! assert_eq!(reply, RespValue::ok());
//!
//! let reply = handler.dispatch("GET", &[RespValue::bulk_string("name")]);
//! assert_eq!(reply, RespValue::bulk_string("Ariz"));
//! ```
//!
//! ## Supported Commands
//!
//! - `PING [message]`
//! - `SET key value` / `GET key` / `MGET key [key ...]`
//! - `INCR key` / `DECR key`
//! - `HSET hash field value` / `HGET hash field` / `HGETALL hash`
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP decoder and the reply type
//! - [`storage`]: The string and hash stores
//! - [`commands`]: Command registry and handlers
//! - [`connection`]: Client connection loop
//! - [`config`]: Command-line configuration
//!
//! ## Consistency
//!
//! Each store has its own reader/writer lock. Operations on one key (or one
//! hash) are linearizable; `MGET` reads each key separately and offers no
//! multi-key snapshot. Nothing is persisted or expired.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;

pub use commands::{CommandError, CommandHandler};
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, RespParser, RespValue};
pub use storage::{HashStore, StorageError, StringStore};

/// The default port MiniKV listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host MiniKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of MiniKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
