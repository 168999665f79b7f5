//! Command Registry
//!
//! The fixed table from command name to [`Command`]. It is built once, on
//! first use, and only ever read afterwards, so lookups need no locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static REGISTRY: LazyLock<CommandRegistry> = LazyLock::new(CommandRegistry::with_builtin_commands);

/// How many arguments (after the command name) a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments.
    Exact(usize),
    /// Between `min` and `max` arguments, inclusive.
    Range(usize, usize),
    /// At least this many arguments.
    AtLeast(usize),
}

impl Arity {
    /// Returns true if `count` arguments satisfy this arity.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(n) => count >= n,
        }
    }
}

/// Every command the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Ping,
    Set,
    Get,
    HSet,
    HGet,
    HGetAll,
    MGet,
    Incr,
    Decr,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::Ping,
        Command::Set,
        Command::Get,
        Command::HSet,
        Command::HGet,
        Command::HGetAll,
        Command::MGet,
        Command::Incr,
        Command::Decr,
    ];

    /// Canonical uppercase name.
    pub fn name(self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Set => "SET",
            Command::Get => "GET",
            Command::HSet => "HSET",
            Command::HGet => "HGET",
            Command::HGetAll => "HGETALL",
            Command::MGet => "MGET",
            Command::Incr => "INCR",
            Command::Decr => "DECR",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Command::Ping => Arity::Range(0, 1),
            Command::Set => Arity::Exact(2),
            Command::Get => Arity::Exact(1),
            Command::HSet => Arity::Exact(3),
            Command::HGet => Arity::Exact(2),
            Command::HGetAll => Arity::Exact(1),
            Command::MGet => Arity::AtLeast(1),
            Command::Incr => Arity::Exact(1),
            Command::Decr => Arity::Exact(1),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable name → command table.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Command>,
}

impl CommandRegistry {
    /// Builds the table with every built-in command.
    pub fn with_builtin_commands() -> Self {
        let commands = Command::ALL
            .iter()
            .map(|command| (command.name(), *command))
            .collect();

        Self { commands }
    }

    /// The process-wide registry.
    pub fn global() -> &'static CommandRegistry {
        &REGISTRY
    }

    /// Looks up a command by name, ignoring ASCII case.
    pub fn lookup(&self, name: &str) -> Option<Command> {
        if let Some(command) = self.commands.get(name) {
            return Some(*command);
        }
        self.commands.get(name.to_ascii_uppercase().as_str()).copied()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_command_is_registered() {
        let registry = CommandRegistry::global();
        assert_eq!(registry.len(), Command::ALL.len());

        for command in Command::ALL {
            assert_eq!(registry.lookup(command.name()), Some(command));
        }
    }

    #[test]
    fn test_lookup_ignores_case() {
        let registry = CommandRegistry::global();
        assert_eq!(registry.lookup("hgetall"), Some(Command::HGetAll));
        assert_eq!(registry.lookup("Incr"), Some(Command::Incr));
        assert_eq!(registry.lookup("DEL"), None);
        assert_eq!(registry.lookup(""), None);
    }

    #[test]
    fn test_arity() {
        assert!(Arity::Range(0, 1).accepts(0));
        assert!(Arity::Range(0, 1).accepts(1));
        assert!(!Arity::Range(0, 1).accepts(2));

        assert!(Arity::Exact(3).accepts(3));
        assert!(!Arity::Exact(3).accepts(2));

        assert!(!Arity::AtLeast(1).accepts(0));
        assert!(Arity::AtLeast(1).accepts(50));
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command::HGetAll.to_string(), "HGETALL");
        assert_eq!(Command::MGet.arity(), Arity::AtLeast(1));
    }
}
