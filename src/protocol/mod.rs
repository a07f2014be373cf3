//! Tuple Space Line Protocol
//!
//! Requests and responses are newline-delimited ASCII frames with a
//! 4-character length header.
//!
//! ## Modules
//!
//! - `types`: `Request`, `Response`, `Opcode` and frame serialization
//! - `parser`: line splitting and request/response decoding
//!
//! ## Example
//!
//! ```
//! use tuplespace::protocol::{decode_request, parse_line, Request};
//!
//! let data = b"005 P a 1\n";
//! let (line, consumed) = parse_line(data).unwrap();
//! assert_eq!(consumed, data.len());
//! assert_eq!(decode_request(&line).unwrap(), Request::put("a", "1"));
//! ```

pub mod parser;
pub mod types;

pub use parser::{
    decode_line, decode_request, decode_response, parse_line, ParseError, ParseResult,
    ResponseFrame,
};
pub use types::{text_len, Opcode, Request, Response, INVALID_FORMAT_FRAME};
