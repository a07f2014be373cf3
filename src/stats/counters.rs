//! Operation counters and statistics snapshots.
//!
//! Every counter is an independent relaxed atomic. They describe what the
//! server has done and never feed back into its behaviour, so a counter may
//! be seen slightly ahead of or behind the store mutation it describes.

use crate::protocol::Opcode;
use crate::storage::StoreScan;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide operation and connection counters.
#[derive(Debug, Default)]
pub struct OpCounters {
    /// Operations attempted, successful or not
    pub total_ops: AtomicU64,
    pub puts: AtomicU64,
    pub gets: AtomicU64,
    pub reads: AtomicU64,
    /// Operations that failed a precondition
    pub errors: AtomicU64,
    /// Connections admitted since startup
    pub connections_accepted: AtomicU64,
    /// Connections currently being served
    pub active_connections: AtomicU64,
    /// Connections turned away by admission control
    pub connections_rejected: AtomicU64,
}

impl OpCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one attempted operation.
    pub fn operation(&self, opcode: Opcode, failed: bool) {
        self.total_ops.fetch_add(1, Ordering::Relaxed);
        let per_op = match opcode {
            Opcode::Put => &self.puts,
            Opcode::Get => &self.gets,
            Opcode::Read => &self.reads,
        };
        per_op.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }
}

/// A point-in-time view of the tuple space.
///
/// Built from a shard-by-shard scan plus relaxed counter loads, so it is an
/// approximation whenever clients are active.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSnapshot {
    pub tuple_count: u64,
    /// Mean of key length + value length
    pub avg_tuple_size: f64,
    pub avg_key_size: f64,
    pub avg_value_size: f64,
    pub connections_accepted: u64,
    pub active_connections: u64,
    pub connections_rejected: u64,
    pub total_ops: u64,
    pub puts: u64,
    pub gets: u64,
    pub reads: u64,
    pub errors: u64,
}

impl StatsSnapshot {
    /// Combines a store scan with the current counter values.
    pub fn capture(scan: StoreScan, counters: &OpCounters) -> Self {
        let avg = |total: u64| {
            if scan.tuples == 0 {
                0.0
            } else {
                total as f64 / scan.tuples as f64
            }
        };

        Self {
            tuple_count: scan.tuples,
            avg_tuple_size: avg(scan.key_chars + scan.value_chars),
            avg_key_size: avg(scan.key_chars),
            avg_value_size: avg(scan.value_chars),
            connections_accepted: counters.connections_accepted.load(Ordering::Relaxed),
            active_connections: counters.active_connections.load(Ordering::Relaxed),
            connections_rejected: counters.connections_rejected.load(Ordering::Relaxed),
            total_ops: counters.total_ops.load(Ordering::Relaxed),
            puts: counters.puts.load(Ordering::Relaxed),
            gets: counters.gets.load(Ordering::Relaxed),
            reads: counters.reads.load(Ordering::Relaxed),
            errors: counters.errors.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========== Tuple Space Statistics ==========")?;
        writeln!(f, "Tuple count       : {}", self.tuple_count)?;
        writeln!(f, "Avg tuple size    : {:.2}", self.avg_tuple_size)?;
        writeln!(f, "Avg key size      : {:.2}", self.avg_key_size)?;
        writeln!(f, "Avg value size    : {:.2}", self.avg_value_size)?;
        writeln!(f, "Client count      : {}", self.connections_accepted)?;
        writeln!(f, "Active clients    : {}", self.active_connections)?;
        writeln!(f, "Rejected clients  : {}", self.connections_rejected)?;
        writeln!(f, "Total operations  : {}", self.total_ops)?;
        writeln!(f, "Total PUTs        : {}", self.puts)?;
        writeln!(f, "Total GETs        : {}", self.gets)?;
        writeln!(f, "Total READs       : {}", self.reads)?;
        writeln!(f, "Total ERRs        : {}", self.errors)?;
        write!(f, "============================================")
    }
}
