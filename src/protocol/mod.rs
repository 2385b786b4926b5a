//! Wire Protocol
//!
//! Requests arrive either as inline text lines or as RESP arrays of bulk
//! strings; replies go out as RESP status, error and bulk lines.
//!
//! ## Modules
//!
//! - `types`: the `RespValue` enum for decoded values
//! - `parser`: incremental decoder from bytes to [`Command`]s
//! - `reply`: the `Reply` enum and its encoder
//!
//! ## Example
//!
//! ```
//! use mintkv::protocol::{Decoded, Reply, RespParser};
//! use bytes::Bytes;
//!
//! let (decoded, consumed) = RespParser::new().parse(b"PING\r\n").unwrap().unwrap();
//! assert_eq!(consumed, 6);
//! assert!(matches!(decoded, Decoded::Command(ref cmd) if cmd.name == "PING"));
//!
//! assert_eq!(Reply::Bulk(Bytes::from("bar")).encode(), b"$3\r\nbar\r\n");
//! ```

pub mod parser;
pub mod reply;
pub mod types;

pub use parser::{Command, Decoded, ParseError, ParseResult, RespParser};
pub use reply::Reply;
pub use types::RespValue;
