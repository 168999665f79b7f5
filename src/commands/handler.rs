//! Command Handler
//!
//! Receives decoded requests, resolves the command through the registry,
//! checks its arity, runs it against the stores and returns the reply.
//!
//! ## Supported Commands
//!
//! - `PING [message]` - Liveness probe
//! - `SET key value` - Set a key
//! - `GET key` - Get a key's value
//! - `MGET key [key ...]` - Get multiple keys
//! - `INCR key` / `DECR key` - Add or subtract one
//! - `HSET hash field value` - Set a hash field
//! - `HGET hash field` - Get a hash field
//! - `HGETALL hash` - Get every field and value of a hash
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │  execute()  │───>│ dispatch()  │───>│   cmd_*()   │     │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘     │
//! │                            │                  │             │
//! │                   CommandRegistry    StringStore/HashStore  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers check every argument before touching a store, so a rejected
//! command never leaves a partial write behind.

use crate::commands::error::CommandError;
use crate::commands::registry::{Command, CommandRegistry};
use crate::protocol::RespValue;
use crate::storage::{HashStore, StringStore};
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

type CommandResult = Result<RespValue, CommandError>;

/// Dispatches commands against the shared stores.
///
/// Cheap to clone; every connection gets its own copy pointing at the same
/// stores.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    strings: Arc<StringStore>,
    hashes: Arc<HashStore>,
    registry: &'static CommandRegistry,
}

impl CommandHandler {
    /// Creates a handler over the given stores.
    pub fn new(strings: Arc<StringStore>, hashes: Arc<HashStore>) -> Self {
        Self {
            strings,
            hashes,
            registry: CommandRegistry::global(),
        }
    }

    /// Executes a decoded request frame and returns the reply.
    ///
    /// The frame must be an array whose first element names the command.
    pub fn execute(&self, request: RespValue) -> RespValue {
        let Some(parts) = request.into_array() else {
            return CommandError::InvalidCommand.into();
        };

        let Some((name, args)) = parts.split_first() else {
            return CommandError::InvalidCommand.into();
        };

        match name.as_str() {
            Some(name) => self.dispatch(name, args),
            None => CommandError::InvalidCommand.into(),
        }
    }

    /// Runs the command called `name` with `args` (the arguments after the
    /// name). Always returns exactly one reply; failures become error replies.
    pub fn dispatch(&self, name: &str, args: &[RespValue]) -> RespValue {
        let result = match self.registry.lookup(name) {
            Some(command) => self.run(command, args),
            None => Err(CommandError::UnknownCommand(name.to_string())),
        };

        result.unwrap_or_else(|err| {
            debug!(command = %name, error = %err, "Command failed");
            err.into()
        })
    }

    fn run(&self, command: Command, args: &[RespValue]) -> CommandResult {
        if !command.arity().accepts(args.len()) {
            return Err(CommandError::WrongArity(command.name()));
        }

        match command {
            Command::Ping => self.cmd_ping(args),
            Command::Set => self.cmd_set(args),
            Command::Get => self.cmd_get(args),
            Command::HSet => self.cmd_hset(args),
            Command::HGet => self.cmd_hget(args),
            Command::HGetAll => self.cmd_hgetall(args),
            Command::MGet => self.cmd_mget(args),
            Command::Incr => self.cmd_incr_by(args, 1),
            Command::Decr => self.cmd_incr_by(args, -1),
        }
    }

    // ========================================================================
    // Server Commands
    // ========================================================================

    /// PING [message]
    fn cmd_ping(&self, args: &[RespValue]) -> CommandResult {
        // The echo is a bulk string, not a simple string, so a message
        // containing CRLF stays framed.
        match args.first().and_then(RespValue::payload) {
            Some(message) => Ok(RespValue::bulk_string(message)),
            None => Ok(RespValue::pong()),
        }
    }

    // ========================================================================
    // String Commands
    // ========================================================================

    /// SET key value
    fn cmd_set(&self, args: &[RespValue]) -> CommandResult {
        let key = payload(&args[0])?;
        let value = payload(&args[1])?;

        self.strings.set(key, value);
        Ok(RespValue::ok())
    }

    /// GET key
    fn cmd_get(&self, args: &[RespValue]) -> CommandResult {
        let key = payload(&args[0])?;
        Ok(RespValue::from_option(self.strings.get(&key)))
    }

    /// MGET key [key ...]
    fn cmd_mget(&self, args: &[RespValue]) -> CommandResult {
        let keys = args.iter().map(payload).collect::<Result<Vec<_>, _>>()?;

        let values = self
            .strings
            .mget(&keys)
            .into_iter()
            .map(RespValue::from_option)
            .collect();

        Ok(RespValue::array(values))
    }

    /// INCR key / DECR key
    fn cmd_incr_by(&self, args: &[RespValue], delta: i64) -> CommandResult {
        let key = payload(&args[0])?;
        let value = self.strings.increment_or_init(&key, delta)?;
        Ok(RespValue::bulk_string(value))
    }

    // ========================================================================
    // Hash Commands
    // ========================================================================

    /// HSET hash field value
    fn cmd_hset(&self, args: &[RespValue]) -> CommandResult {
        let hash = payload(&args[0])?;
        let field = payload(&args[1])?;
        let value = payload(&args[2])?;

        self.hashes.set_field(hash, field, value);
        Ok(RespValue::ok())
    }

    /// HGET hash field
    fn cmd_hget(&self, args: &[RespValue]) -> CommandResult {
        let hash = payload(&args[0])?;
        let field = payload(&args[1])?;

        Ok(RespValue::from_option(self.hashes.get_field(&hash, &field)))
    }

    /// HGETALL hash
    fn cmd_hgetall(&self, args: &[RespValue]) -> CommandResult {
        let hash = payload(&args[0])?;

        let Some(fields) = self.hashes.get_all(&hash) else {
            return Ok(RespValue::null());
        };

        let flattened = fields
            .into_iter()
            .flat_map(|(field, value)| [RespValue::BulkString(field), RespValue::BulkString(value)])
            .collect();

        Ok(RespValue::array(flattened))
    }
}

/// Extracts the string payload of an argument.
fn payload(arg: &RespValue) -> Result<Bytes, CommandError> {
    arg.payload().ok_or(CommandError::InvalidArgument)
}
