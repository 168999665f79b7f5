//! Storage Module
//!
//! The two pieces of shared state behind every command. Each store owns its
//! map and its own reader/writer lock, so string and hash traffic never block
//! each other.
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────────────┐
//! │       StringStore        │   │            HashStore             │
//! │  RwLock<HashMap<         │   │  RwLock<HashMap<                 │
//! │    key, value>>          │   │    hash, HashMap<field, value>>> │
//! └──────────────────────────┘   └──────────────────────────────────┘
//! ```
//!
//! Both live for the lifetime of the process; nothing here is ever deleted
//! or expired.
//!
//! ## Example
//!
//! ```
//! use minikv::storage::{HashStore, StringStore};
//! use bytes::Bytes;
//!
//! let strings = StringStore::new();
//! strings.set(Bytes::from("name"), Bytes::from("Ariz"));
//! assert_eq!(strings.get(b"name"), Some(Bytes::from("Ariz")));
//!
//! let hashes = HashStore::new();
//! hashes.set_field(Bytes::from("user:1"), Bytes::from("lang"), Bytes::from("rust"));
//! assert_eq!(hashes.get_field(b"user:1", b"lang"), Some(Bytes::from("rust")));
//! ```

pub mod hashes;
pub mod strings;

pub use hashes::HashStore;
pub use strings::{StorageError, StringStore};
