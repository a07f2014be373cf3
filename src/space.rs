//! The tuple space service.
//!
//! One `TupleSpace` is built at startup and shared by `Arc` with every
//! connection task and with the stats reporter. It owns the store and the
//! counters, so nothing in the crate reaches for process-wide statics.

use crate::protocol::Opcode;
use crate::stats::{OpCounters, StatsSnapshot};
use crate::storage::{StoreResult, TupleStore};
use tracing::trace;

/// Shared state of one running server.
#[derive(Debug, Default)]
pub struct TupleSpace {
    store: TupleStore,
    counters: OpCounters,
}

impl TupleSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tuple if its key is absent.
    pub fn put(&self, key: &str, value: &str) -> StoreResult {
        let result = self.store.put(key, value);
        self.record(Opcode::Put, key, &result);
        result
    }

    /// Removes a tuple and returns it.
    pub fn get(&self, key: &str) -> StoreResult {
        let result = self.store.get(key);
        self.record(Opcode::Get, key, &result);
        result
    }

    /// Returns a tuple without removing it.
    pub fn read(&self, key: &str) -> StoreResult {
        let result = self.store.read(key);
        self.record(Opcode::Read, key, &result);
        result
    }

    fn record(&self, opcode: Opcode, key: &str, result: &StoreResult) {
        self.counters.operation(opcode, result.is_err());
        trace!(op = %opcode, key = key, ok = result.is_ok(), "Tuple operation");
    }

    pub fn store(&self) -> &TupleStore {
        &self.store
    }

    pub fn counters(&self) -> &OpCounters {
        &self.counters
    }

    /// Captures an approximate snapshot without blocking writers globally.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::capture(self.store.scan(), &self.counters)
    }
}
