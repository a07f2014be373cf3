//! Tuple Space Protocol Types
//!
//! The wire format is plain ASCII, one frame per line. Every frame starts
//! with a zero-padded 3-digit length and a space (a 4-character header),
//! followed by the payload.
//!
//! ## Requests
//!
//! ```text
//! 007 P a 1      PUT  a=1    declared length: 5 + len(key) + len(value)
//! 005 G a        GET  a      declared length: 4 + len(key)
//! 005 R a        READ a      declared length: 4 + len(key)
//! ```
//!
//! ## Responses
//!
//! ```text
//! 019 OK (a, 1) added        declared length: len(status) + 4
//! 024 ERR a does not exist
//! ```
//!
//! The declared lengths are descriptive. Receivers delimit frames by newline
//! and drop the first four characters, so the request formulas are kept
//! exactly as peers compute them even where they disagree with the real
//! payload length.

use crate::storage::{Outcome, StoreError, StoreResult};
use std::fmt;

/// Frame terminator
pub const LF: u8 = b'\n';

/// Length of the `NNN ` header in characters
pub const HEADER_LEN: usize = 4;

/// Requests shorter than this are rejected without further parsing
pub const MIN_REQUEST_LEN: usize = 5;

/// Fixed reply to a request line that is too short to hold a header and an
/// opcode. The prefix is a literal, not computed from the status text.
pub const INVALID_FORMAT_FRAME: &[u8] = b"010 ERR invalid format\n";

/// Length of a piece of text as counted on the wire.
#[inline]
pub fn text_len(s: &str) -> usize {
    s.chars().count()
}

/// The three tuple space operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Insert if absent
    Put,
    /// Remove if present
    Get,
    /// Peek if present
    Read,
}

impl Opcode {
    /// Single-letter code used in request frames.
    pub fn code(self) -> &'static str {
        match self {
            Opcode::Put => "P",
            Opcode::Get => "G",
            Opcode::Read => "R",
        }
    }

    /// Looks up an opcode by its wire code. Codes are case-sensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(Opcode::Put),
            "G" => Some(Opcode::Get),
            "R" => Some(Opcode::Read),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Put => "PUT",
            Opcode::Get => "GET",
            Opcode::Read => "READ",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub opcode: Opcode,
    pub key: String,
    /// Empty for GET and READ
    pub value: String,
}

impl Request {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            opcode: Opcode::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn get(key: impl Into<String>) -> Self {
        Self {
            opcode: Opcode::Get,
            key: key.into(),
            value: String::new(),
        }
    }

    pub fn read(key: impl Into<String>) -> Self {
        Self {
            opcode: Opcode::Read,
            key: key.into(),
            value: String::new(),
        }
    }

    /// The length written into this request's header.
    pub fn declared_len(&self) -> usize {
        match self.opcode {
            Opcode::Put => 5 + text_len(&self.key) + text_len(&self.value),
            Opcode::Get | Opcode::Read => 4 + text_len(&self.key),
        }
    }

    /// Serializes the request as one newline-terminated frame.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        let header = format!("{:03} {} ", self.declared_len(), self.opcode.code());
        buf.extend_from_slice(header.as_bytes());
        buf.extend_from_slice(self.key.as_bytes());
        if self.opcode == Opcode::Put {
            buf.push(b' ');
            buf.extend_from_slice(self.value.as_bytes());
        }
        buf.push(LF);
    }
}

/// A response to send back to a client.
///
/// Its `Display` form is the status text that follows the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `OK (<key>, <value>) added|removed|read`
    Ok(Outcome),
    /// `ERR <detail>`
    Error(String),
}

impl Response {
    pub fn error(detail: impl Into<String>) -> Self {
        Response::Error(detail.into())
    }

    /// Sent to a connection turned away by admission control.
    pub fn server_busy() -> Self {
        Response::error("server busy")
    }

    /// Serializes the response as one newline-terminated frame.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        let status = self.to_string();
        let frame = format!("{:03} {}", text_len(&status) + HEADER_LEN, status);
        buf.extend_from_slice(frame.as_bytes());
        buf.push(LF);
    }
}

impl From<StoreResult> for Response {
    fn from(result: StoreResult) -> Self {
        match result {
            Ok(outcome) => Response::Ok(outcome),
            Err(e) => Response::Error(e.to_string()),
        }
    }
}

impl From<StoreError> for Response {
    fn from(e: StoreError) -> Self {
        Response::Error(e.to_string())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok(outcome) => write!(f, "OK {} {}", outcome.tuple(), outcome.verb()),
            Response::Error(detail) => write!(f, "ERR {}", detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Tuple;

    #[test]
    fn test_put_request_serialize() {
        assert_eq!(Request::put("a", "1").serialize(), b"007 P a 1\n");
        assert_eq!(
            Request::put("name", "Ariz Vega").serialize(),
            b"018 P name Ariz Vega\n"
        );
    }

    #[test]
    fn test_get_and_read_request_serialize() {
        assert_eq!(Request::get("a").serialize(), b"005 G a\n");
        assert_eq!(Request::read("key").serialize(), b"007 R key\n");
    }

    #[test]
    fn test_put_with_empty_value_keeps_separator() {
        assert_eq!(Request::put("k", "").serialize(), b"006 P k \n");
    }

    #[test]
    fn test_declared_len_above_999_is_not_truncated() {
        let key = "k".repeat(1000);
        let frame = Request::get(key.clone()).serialize();
        assert!(frame.starts_with(b"1004 G k"));
    }

    #[test]
    fn test_ok_response_serialize() {
        let added = Response::Ok(Outcome::Added(Tuple::new("a", "1")));
        assert_eq!(added.to_string(), "OK (a, 1) added");
        assert_eq!(added.serialize(), b"019 OK (a, 1) added\n");

        let removed = Response::Ok(Outcome::Removed(Tuple::new("a", "1")));
        assert_eq!(removed.serialize(), b"021 OK (a, 1) removed\n");

        let read = Response::Ok(Outcome::Read(Tuple::new("a", "1")));
        assert_eq!(read.serialize(), b"018 OK (a, 1) read\n");
    }

    #[test]
    fn test_error_response_serialize() {
        let missing = Response::from(StoreError::NotExists("a".into()));
        assert_eq!(missing.serialize(), b"024 ERR a does not exist\n");

        let exists = Response::from(StoreError::AlreadyExists("a".into()));
        assert_eq!(exists.serialize(), b"024 ERR a already exists\n");

        assert_eq!(
            Response::error("unknown command").serialize(),
            b"023 ERR unknown command\n"
        );
        assert_eq!(Response::server_busy().serialize(), b"019 ERR server busy\n");
    }

    #[test]
    fn test_opcode_codes() {
        for op in [Opcode::Put, Opcode::Get, Opcode::Read] {
            assert_eq!(Opcode::from_code(op.code()), Some(op));
        }
        assert_eq!(Opcode::from_code("p"), None);
        assert_eq!(Opcode::from_code("X"), None);
    }
}
