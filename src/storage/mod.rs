//! Storage Module
//!
//! The thread-safe, sharded tuple store behind the tuple space.
//!
//! ## Example
//!
//! ```
//! use tuplespace::storage::{Outcome, TupleStore};
//!
//! let store = TupleStore::new();
//! store.put("colour", "blue").unwrap();
//!
//! match store.read("colour") {
//!     Ok(Outcome::Read(tuple)) => assert_eq!(tuple.value, "blue"),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

pub mod engine;

pub use engine::{Outcome, StoreError, StoreResult, StoreScan, Tuple, TupleStore};
