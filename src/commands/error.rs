//! Command Errors
//!
//! Every way a command can fail. Handlers return these internally and the
//! dispatcher turns them into `-ERR ...` replies; none of them ever tears
//! down a connection.

use crate::protocol::RespValue;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Wrong number of arguments for the named command
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    /// An argument is not a string payload
    #[error("ERR invalid argument type")]
    InvalidArgument,

    /// No handler is registered under this name
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    /// The request is not a non-empty array headed by a command name
    #[error("ERR invalid command format")]
    InvalidCommand,

    /// Increment/decrement failure from the string store
    #[error("ERR {0}")]
    Storage(#[from] StorageError),
}

impl From<CommandError> for RespValue {
    fn from(err: CommandError) -> Self {
        RespValue::error(err.to_string())
    }
}
