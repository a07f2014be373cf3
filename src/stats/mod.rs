//! Statistics Module
//!
//! Operation counters, the snapshot type built from them, and the background
//! reporter that logs a snapshot on a fixed interval.
//!
//! ```text
//! ┌────────────────────────┐        ┌───────────────────────────┐
//! │       TupleSpace       │◀───────│       StatsReporter       │
//! │  TupleStore + Counters │  scan  │  (Background Tokio Task)  │
//! └────────────────────────┘        └───────────────────────────┘
//! ```

pub mod counters;
pub mod reporter;

pub use counters::{OpCounters, StatsSnapshot};
pub use reporter::{ReporterConfig, StatsReporter};
