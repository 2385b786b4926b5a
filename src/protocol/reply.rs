//! Reply Encoding
//!
//! Handlers produce a [`Reply`], and the connection turns it into bytes.
//! Only the reply shapes the server actually emits are modelled here:
//!
//! ```text
//! Status    +OK\r\n
//! Error     -ERR unknown command 'FOO'\r\n
//! Bulk      $3\r\nbar\r\n
//! Null      $-1\r\n
//! BulkList  $1\r\na\r\n$1\r\nb\r\n      (no array header)
//! ```

use crate::protocol::types::{prefix, write_bulk, write_line, RespValue};
use bytes::Bytes;

/// A reply to a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+<text>\r\n`
    Status(String),
    /// `-<text>\r\n`
    Error(String),
    /// `$<len>\r\n<bytes>\r\n`
    Bulk(Bytes),
    /// `$-1\r\n`
    Null,
    /// Each element bulk-encoded back to back. Nested arrays are flattened.
    BulkList(Vec<RespValue>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    pub fn pong() -> Self {
        Reply::Status("PONG".to_string())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    /// Encodes the reply to its wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }

    /// Encodes the reply into an existing buffer.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Status(s) => write_line(buf, prefix::SIMPLE_STRING, s.as_bytes()),
            Reply::Error(s) => write_line(buf, prefix::ERROR, s.as_bytes()),
            Reply::Bulk(data) => write_bulk(buf, data),
            Reply::Null => write_line(buf, prefix::BULK_STRING, b"-1"),
            Reply::BulkList(values) if values.is_empty() => {
                write_line(buf, prefix::SIMPLE_STRING, b"")
            }
            Reply::BulkList(values) => {
                let mut body = Vec::new();
                match write_bulk_list(&mut body, values) {
                    // Only empty nested arrays: same as an empty list.
                    Ok(()) if body.is_empty() => write_line(buf, prefix::SIMPLE_STRING, b""),
                    Ok(()) => buf.extend_from_slice(&body),
                    Err(offending) => write_line(
                        buf,
                        prefix::ERROR,
                        format!("ERR unknown argument type {}", offending).as_bytes(),
                    ),
                }
            }
        }
    }

    /// Returns true if this reply is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

/// On failure, returns the type name of the first element that has no text.
fn write_bulk_list(buf: &mut Vec<u8>, values: &[RespValue]) -> Result<(), &'static str> {
    for value in values {
        match value {
            RespValue::Array(nested) => write_bulk_list(buf, nested)?,
            other => match other.text() {
                Some(text) => write_bulk(buf, &text),
                None => return Err(other.type_name()),
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_error() {
        assert_eq!(Reply::ok().encode(), b"+OK\r\n");
        assert_eq!(Reply::pong().encode(), b"+PONG\r\n");
        assert_eq!(
            Reply::error("ERR unknown command 'FOO'").encode(),
            b"-ERR unknown command 'FOO'\r\n"
        );
    }

    #[test]
    fn test_bulk_and_null() {
        assert_eq!(Reply::Bulk(Bytes::from("bar")).encode(), b"$3\r\nbar\r\n");
        assert_eq!(Reply::Bulk(Bytes::new()).encode(), b"$0\r\n\r\n");
        assert_eq!(Reply::Null.encode(), b"$-1\r\n");
    }

    #[test]
    fn test_bulk_list_concatenates_without_header() {
        let reply = Reply::BulkList(vec![
            RespValue::bulk_string("a"),
            RespValue::Array(vec![RespValue::bulk_string("bc"), RespValue::Integer(7)]),
        ]);
        assert_eq!(reply.encode(), b"$1\r\na\r\n$2\r\nbc\r\n$1\r\n7\r\n");
    }

    #[test]
    fn test_bulk_list_rejects_nil_element() {
        let reply = Reply::BulkList(vec![RespValue::bulk_string("a"), RespValue::Null]);
        assert_eq!(reply.encode(), b"-ERR unknown argument type nil\r\n");
    }

    #[test]
    fn test_empty_bulk_list() {
        assert_eq!(Reply::BulkList(vec![]).encode(), b"+\r\n");
    }

    #[test]
    fn test_bulk_list_of_empty_arrays() {
        let reply = Reply::BulkList(vec![RespValue::Array(vec![])]);
        assert_eq!(reply.encode(), b"+\r\n");

        let reply = Reply::BulkList(vec![
            RespValue::Array(vec![]),
            RespValue::Array(vec![RespValue::Array(vec![])]),
        ]);
        assert_eq!(reply.encode(), b"+\r\n");
    }
}
