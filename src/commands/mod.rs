//! Command Module
//!
//! The command-execution core: a fixed registry of commands and the handler
//! that validates arguments, runs each command against the stores and
//! produces a [`RespValue`](crate::protocol::RespValue) reply.
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP Parser    │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐      ┌──────────────────┐
//! │ CommandHandler  │─────>│ CommandRegistry  │
//! │  - Validate     │      └──────────────────┘
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────┐
//! │  StringStore  │  HashStore  │  (storage module)
//! └─────────────────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `PING`, `SET`, `GET`, `MGET`, `INCR`, `DECR`
//! - `HSET`, `HGET`, `HGETALL`

pub mod error;
pub mod handler;
pub mod registry;

pub use error::CommandError;
pub use handler::CommandHandler;
pub use registry::{Arity, Command, CommandRegistry};
