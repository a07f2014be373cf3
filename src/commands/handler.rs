//! Command Handler
//!
//! Turns decoded request frames into tuple space operations.
//!
//! ## Supported Commands
//!
//! - `P key value` - insert the tuple if `key` is absent
//! - `G key` - remove the tuple for `key` and return it
//! - `R key` - return the tuple for `key`, leaving it in place
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │  decode()   │───>│  dispatch() │───>│  Response   │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                            │                                │
//! │                            ▼                                │
//! │                       TupleSpace                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::protocol::{decode_request, Opcode, ParseError, Request, Response};
use crate::space::TupleSpace;
use std::sync::Arc;

/// What the connection loop should send back for one request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A regular response frame
    Response(Response),
    /// The fixed `010 ERR invalid format` frame
    InvalidFormat,
}

/// Executes requests against a shared tuple space.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    space: Arc<TupleSpace>,
}

impl CommandHandler {
    pub fn new(space: Arc<TupleSpace>) -> Self {
        Self { space }
    }

    /// Decodes one request line and executes it.
    ///
    /// Malformed lines never reach the tuple space and are not counted as
    /// operations.
    pub fn handle_line(&self, line: &str) -> Reply {
        match decode_request(line) {
            Ok(request) => Reply::Response(self.execute(&request)),
            Err(ParseError::InvalidFormat) => Reply::InvalidFormat,
            Err(e) => Reply::Response(Response::error(e.to_string())),
        }
    }

    /// Executes a decoded request.
    pub fn execute(&self, request: &Request) -> Response {
        let key = request.key.as_str();
        let result = match request.opcode {
            Opcode::Put => self.space.put(key, &request.value),
            Opcode::Get => self.space.get(key),
            Opcode::Read => self.space.read(key),
        };
        Response::from(result)
    }

    pub fn space(&self) -> &Arc<TupleSpace> {
        &self.space
    }
}
