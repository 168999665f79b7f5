//! RESP Protocol Implementation
//!
//! The wire codec that sits around the command core: requests are decoded
//! into [`RespValue`] arrays, and the [`RespValue`] each handler returns is
//! encoded back onto the socket.
//!
//! ## Modules
//!
//! - `types`: The `RespValue` reply enum and its serialization
//! - `parser`: Incremental decoder for incoming requests
//!
//! ## Example
//!
//! ```
//! use minikv::protocol::{parse_message, RespValue};
//!
//! let (request, _) = parse_message(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
//!     .unwrap()
//!     .unwrap();
//! assert!(matches!(request, RespValue::Array(_)));
//!
//! let reply = RespValue::bulk_string("Ariz");
//! assert_eq!(reply.serialize(), b"$4\r\nAriz\r\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse_message, ParseError, ParseResult, RespParser};
pub use types::RespValue;
