//! Values that can appear inside a request frame.
//!
//! Each value opens with a one-byte tag and its header line ends in `\r\n`:
//!
//! ```text
//! +PONG\r\n                        simple string
//! -ERR bad\r\n                     error
//! :42\r\n                          integer
//! $3\r\nfoo\r\n                    bulk string ($-1 is nil)
//! *2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n  array
//! ```

use bytes::Bytes;

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Leading tag byte of each value type
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A decoded RESP value.
///
/// Command arguments keep whatever type the client framed them with, so
/// handlers can tell text arguments apart from nil or nested arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Format: `+<string>\r\n`
    SimpleString(String),

    /// Format: `-<error message>\r\n`
    Error(String),

    /// 64-bit signed integer. Format: `:<integer>\r\n`
    Integer(i64),

    /// Binary-safe string. Format: `$<length>\r\n<data>\r\n`
    BulkString(Bytes),

    /// Null bulk string (`$-1\r\n`) or null array (`*-1\r\n`)
    Null,

    /// Format: `*<count>\r\n<element1><element2>...`
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Creates a new bulk string value.
    ///
    /// # Example
    /// ```
    /// use mintkv::protocol::types::RespValue;
    /// use bytes::Bytes;
    /// let bulk = RespValue::bulk_string(Bytes::from("hello"));
    /// ```
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// Builds the array-of-bulk-strings frame a client sends for a command.
    ///
    /// # Example
    /// ```
    /// use mintkv::protocol::types::RespValue;
    /// let frame = RespValue::command(&["GET", "name"]);
    /// assert_eq!(frame.serialize(), b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n");
    /// ```
    pub fn command<T: AsRef<[u8]>>(parts: &[T]) -> Self {
        RespValue::Array(
            parts
                .iter()
                .map(|p| RespValue::BulkString(Bytes::copy_from_slice(p.as_ref())))
                .collect(),
        )
    }

    /// Serializes the value to its wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the value into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => write_line(buf, prefix::SIMPLE_STRING, s.as_bytes()),
            RespValue::Error(s) => write_line(buf, prefix::ERROR, s.as_bytes()),
            RespValue::Integer(n) => write_line(buf, prefix::INTEGER, n.to_string().as_bytes()),
            RespValue::BulkString(data) => write_bulk(buf, data),
            RespValue::Null => write_line(buf, prefix::BULK_STRING, b"-1"),
            RespValue::Array(values) => {
                write_line(buf, prefix::ARRAY, values.len().to_string().as_bytes());
                for value in values {
                    value.serialize_into(buf);
                }
            }
        }
    }

    /// Returns the textual content of a line-typed or bulk value.
    ///
    /// Integers render as their decimal text. `Null` and arrays carry no text.
    pub fn text(&self) -> Option<Bytes> {
        match self {
            RespValue::BulkString(b) => Some(b.clone()),
            RespValue::SimpleString(s) | RespValue::Error(s) => Some(Bytes::from(s.clone())),
            RespValue::Integer(n) => Some(Bytes::from(n.to_string())),
            RespValue::Null | RespValue::Array(_) => None,
        }
    }

    /// Short type label used in error replies and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            RespValue::SimpleString(_) => "simple-string",
            RespValue::Error(_) => "error",
            RespValue::Integer(_) => "integer",
            RespValue::BulkString(_) => "bulk-string",
            RespValue::Null => "nil",
            RespValue::Array(_) => "array",
        }
    }
}

/// `<tag><text>\r\n`
pub(crate) fn write_line(buf: &mut Vec<u8>, tag: u8, text: &[u8]) {
    buf.push(tag);
    buf.extend_from_slice(text);
    buf.extend_from_slice(CRLF);
}

/// `$<len>\r\n<data>\r\n`
pub(crate) fn write_bulk(buf: &mut Vec<u8>, data: &[u8]) {
    write_line(buf, prefix::BULK_STRING, data.len().to_string().as_bytes());
    buf.extend_from_slice(data);
    buf.extend_from_slice(CRLF);
}
