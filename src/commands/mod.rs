//! Command Module
//!
//! Receives request lines from a connection, executes them against the
//! tuple space and returns the reply to send.
//!
//! ```text
//! Request line
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Line decoder   │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   TupleSpace    │  (space module)
//! └─────────────────┘
//! ```

pub mod handler;

pub use handler::{CommandHandler, Reply};
