//! Line Protocol Parser
//!
//! Frames are delimited by newlines only. The parser works on a byte buffer
//! the same way the connection loop does:
//!
//! 1. Append incoming network data to a buffer
//! 2. Call [`parse_line`] to find a complete line
//! 3. If found, advance the buffer by `consumed` bytes and decode the line
//! 4. If not, wait for more data
//!
//! Decoding never looks at the declared length. It drops the first four
//! characters and splits the rest on the first two spaces.

use crate::protocol::types::{text_len, Opcode, Request, HEADER_LEN, LF, MIN_REQUEST_LEN};
use thiserror::Error;

/// Errors that can occur while decoding a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Request line too short to carry a header and an opcode
    #[error("invalid format")]
    InvalidFormat,

    /// Opcode other than P, G or R
    #[error("unknown command")]
    UnknownCommand(String),

    /// A response line without a numeric header
    #[error("malformed response frame: {0:?}")]
    MalformedResponse(String),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Finds the first complete line in `buf`.
///
/// Returns the line without its terminator and the number of bytes consumed,
/// or `None` if no newline has arrived yet. A `\r` right before the newline
/// is dropped. Invalid UTF-8 is replaced rather than rejected.
pub fn parse_line(buf: &[u8]) -> Option<(String, usize)> {
    let pos = buf.iter().position(|&b| b == LF)?;
    Some((decode_line(&buf[..pos]), pos + 1))
}

/// Decodes raw line bytes (terminator already removed).
pub fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Decodes one request line.
///
/// Missing key or value fields decode as empty text.
///
/// # Example
///
/// ```
/// use tuplespace::protocol::{decode_request, Opcode};
///
/// let req = decode_request("005 P a 1").unwrap();
/// assert_eq!(req.opcode, Opcode::Put);
/// assert_eq!((req.key.as_str(), req.value.as_str()), ("a", "1"));
/// ```
pub fn decode_request(line: &str) -> ParseResult<Request> {
    if text_len(line) < MIN_REQUEST_LEN {
        return Err(ParseError::InvalidFormat);
    }

    // The header is dropped unconditionally, whatever it contains.
    let start = line
        .char_indices()
        .nth(HEADER_LEN)
        .map(|(i, _)| i)
        .ok_or(ParseError::InvalidFormat)?;

    let mut fields = line[start..].splitn(3, ' ');
    let code = fields.next().unwrap_or_default();
    let key = fields.next().unwrap_or_default();
    let value = fields.next().unwrap_or_default();

    let opcode =
        Opcode::from_code(code).ok_or_else(|| ParseError::UnknownCommand(code.to_string()))?;

    Ok(Request {
        opcode,
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// A response frame as seen by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Length carried in the header
    pub declared_len: usize,
    /// Everything after the header
    pub status: String,
}

impl ResponseFrame {
    pub fn is_ok(&self) -> bool {
        self.status.starts_with("OK ")
    }
}

/// Decodes one response line.
pub fn decode_response(line: &str) -> ParseResult<ResponseFrame> {
    let malformed = || ParseError::MalformedResponse(line.to_string());

    let (header, status) = line.split_once(' ').ok_or_else(malformed)?;
    if header.len() < HEADER_LEN - 1 || !header.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let declared_len = header.parse().map_err(|_| malformed())?;

    Ok(ResponseFrame {
        declared_len,
        status: status.to_string(),
    })
}
