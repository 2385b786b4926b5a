//! Incremental Command Decoder
//!
//! This module turns the bytes buffered for a connection into commands.
//! Two framings share the same stream:
//!
//! - **Inline**: any line whose first byte is not `*`. The whole trimmed line
//!   becomes the command name, upper-cased, with no arguments.
//! - **Array**: `*<n>\r\n` followed by `n` RESP values. Element 0 names the
//!   command, the rest are its arguments in order.
//!
//! ## How the Parser Works
//!
//! The parser reads from a buffer and returns either:
//! - `Ok(Some((decoded, consumed)))` - one unit was decoded from `consumed` bytes
//! - `Ok(None)` - need more data, the message is incomplete
//! - `Err(ParseError)` - invalid protocol data, the connection must be dropped
//!
//! A decoded unit is either a [`Command`] or [`Decoded::Empty`] (blank inline
//! line, empty or null array), which the caller skips.

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while decoding a command.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Unknown type prefix byte inside an array frame
    #[error("unknown type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// Invalid integer or length field
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in an integer or length field
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative (but not -1 for null)
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Element 0 of a command array has no text
    #[error("invalid command name of type {0}")]
    InvalidCommandName(&'static str),

    /// Protocol violation (missing CRLF, too deep, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The message exceeds maximum allowed size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array nesting depth (prevent stack overflow)
pub const MAX_NESTING_DEPTH: usize = 32;

/// A command name (upper-cased) and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<RespValue>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<RespValue>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// One decoded unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Command(Command),
    /// Nothing to execute; the caller reads again.
    Empty,
}

/// An incremental command decoder.
///
/// # Example
///
/// ```
/// use mintkv::protocol::{Decoded, RespParser};
///
/// let mut parser = RespParser::new();
/// let (decoded, consumed) = parser
///     .parse(b"*2\r\n$3\r\nget\r\n$4\r\nname\r\n")
///     .unwrap()
///     .unwrap();
/// assert_eq!(consumed, 23);
/// match decoded {
///     Decoded::Command(cmd) => assert_eq!(cmd.name, "GET"),
///     Decoded::Empty => unreachable!(),
/// }
/// ```
#[derive(Debug, Default)]
pub struct RespParser {
    /// Current nesting depth (for array parsing)
    depth: usize,
}

impl RespParser {
    /// Creates a new parser instance.
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Attempts to decode one command from the front of `buf`.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(Decoded, usize)>> {
        self.depth = 0;

        let Some(&first) = buf.first() else {
            return Ok(None);
        };

        if first != prefix::ARRAY {
            return Ok(parse_inline(buf));
        }

        match self.parse_value(buf)? {
            Some((value, consumed)) => Ok(Some((into_command(value)?, consumed))),
            None => Ok(None),
        }
    }

    fn parse_value(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::ProtocolError(format!(
                "maximum nesting depth exceeded: {}",
                MAX_NESTING_DEPTH
            )));
        }

        match buf[0] {
            prefix::SIMPLE_STRING => {
                Ok(parse_text_line(buf).map(|(s, n)| (RespValue::SimpleString(s), n)))
            }
            prefix::ERROR => Ok(parse_text_line(buf).map(|(s, n)| (RespValue::Error(s), n))),
            prefix::INTEGER => Ok(parse_number_line(buf)?.map(|(v, n)| (RespValue::Integer(v), n))),
            prefix::BULK_STRING => parse_bulk_string(buf),
            prefix::ARRAY => self.parse_array(buf),
            other => Err(ParseError::UnknownPrefix(other)),
        }
    }

    /// Parses an array: `*<count>\r\n<elements...>`
    fn parse_array(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let (count, mut consumed) = match parse_number_line(buf)? {
            Some(header) => header,
            None => return Ok(None),
        };

        if count == -1 {
            return Ok(Some((RespValue::Null, consumed)));
        }
        if count < 0 {
            return Err(ParseError::InvalidArrayLength(count));
        }

        // Cap the up-front allocation; a bogus count fails on missing data anyway.
        let mut elements = Vec::with_capacity((count as usize).min(1024));

        self.depth += 1;
        for _ in 0..count {
            match self.parse_value(&buf[consumed..]) {
                Ok(Some((value, element_consumed))) => {
                    elements.push(value);
                    consumed += element_consumed;
                }
                other => {
                    self.depth -= 1;
                    return other.map(|_| None);
                }
            }
        }
        self.depth -= 1;

        Ok(Some((RespValue::Array(elements), consumed)))
    }
}

/// Parses an inline command line terminated by `\n`.
fn parse_inline(buf: &[u8]) -> Option<(Decoded, usize)> {
    let newline = buf.iter().position(|&b| b == b'\n')?;
    let line = buf[..newline].trim_ascii();

    let decoded = if line.is_empty() {
        Decoded::Empty
    } else {
        let name = String::from_utf8_lossy(line).to_uppercase();
        Decoded::Command(Command::new(name, Vec::new()))
    };

    Some((decoded, newline + 1))
}

/// Converts a top-level array into a command.
fn into_command(value: RespValue) -> ParseResult<Decoded> {
    let RespValue::Array(elements) = value else {
        return Ok(Decoded::Empty);
    };

    let mut elements = elements.into_iter();
    let Some(head) = elements.next() else {
        return Ok(Decoded::Empty);
    };

    let name = head
        .text()
        .ok_or(ParseError::InvalidCommandName(head.type_name()))?;

    Ok(Decoded::Command(Command::new(
        String::from_utf8_lossy(&name).to_uppercase(),
        elements.collect(),
    )))
}

/// Reads `<tag><text>\r\n`, returning the trimmed text and bytes consumed.
fn parse_line(buf: &[u8]) -> Option<(&[u8], usize)> {
    let pos = find_crlf(&buf[1..])?;
    // +1 for prefix, +2 for CRLF
    Some((buf[1..1 + pos].trim_ascii(), 1 + pos + 2))
}

/// Line payloads are not required to be UTF-8; invalid bytes are replaced.
fn parse_text_line(buf: &[u8]) -> Option<(String, usize)> {
    parse_line(buf)
        .map(|(content, consumed)| (String::from_utf8_lossy(content).into_owned(), consumed))
}

fn parse_number_line(buf: &[u8]) -> ParseResult<Option<(i64, usize)>> {
    match parse_line(buf) {
        Some((content, consumed)) => {
            let s = std::str::from_utf8(content)
                .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
            let n: i64 = s
                .parse()
                .map_err(|_| ParseError::InvalidInteger(s.to_string()))?;
            Ok(Some((n, consumed)))
        }
        None => Ok(None),
    }
}

/// Parses a bulk string: `$<length>\r\n<data>\r\n`
fn parse_bulk_string(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    let (length, data_start) = match parse_number_line(buf)? {
        Some(header) => header,
        None => return Ok(None),
    };

    if length == -1 {
        return Ok(Some((RespValue::Null, data_start)));
    }
    if length < 0 {
        return Err(ParseError::InvalidBulkLength(length));
    }

    let length = length as usize;
    if length > MAX_BULK_SIZE {
        return Err(ParseError::MessageTooLarge {
            size: length,
            max: MAX_BULK_SIZE,
        });
    }

    let total_needed = data_start + length + 2;
    if buf.len() < total_needed {
        return Ok(None);
    }

    if &buf[data_start + length..total_needed] != CRLF {
        return Err(ParseError::ProtocolError(
            "bulk string missing trailing CRLF".to_string(),
        ));
    }

    let data = Bytes::copy_from_slice(&buf[data_start..data_start + length]);
    Ok(Some((RespValue::BulkString(data), total_needed)))
}

/// Finds the position of CRLF in the buffer.
///
/// Returns the position of `\r` if found, or None if CRLF is not present.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}
