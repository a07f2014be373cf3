//! Background Stats Reporter
//!
//! A Tokio task that wakes on a fixed interval, takes a snapshot of the
//! tuple space and logs it.
//!
//! ## Design
//!
//! 1. Sleeps for the configured interval (default: 10s)
//! 2. Scans the store shard by shard and reads the counters
//! 3. Logs the console block, and the snapshot as structured fields at debug
//! 4. Publishes the snapshot to subscribers
//!
//! The snapshot is never used for decisions, so it is taken without any
//! global lock and may be slightly stale.

use super::StatsSnapshot;
use crate::space::TupleSpace;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Configuration for the stats reporter.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Time between snapshots
    pub interval: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
        }
    }
}

/// A handle to the running reporter.
///
/// Dropping the handle interrupts the reporter during its sleep.
#[derive(Debug)]
pub struct StatsReporter {
    shutdown_tx: watch::Sender<bool>,
    /// Latest snapshot, `None` until the first interval has passed
    snapshot_rx: watch::Receiver<Option<StatsSnapshot>>,
}

impl StatsReporter {
    /// Starts the reporter as a background task.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use tuplespace::space::TupleSpace;
    /// use tuplespace::stats::{ReporterConfig, StatsReporter};
    /// use std::sync::Arc;
    ///
    /// let space = Arc::new(TupleSpace::new());
    /// let reporter = StatsReporter::start(space, ReporterConfig::default());
    ///
    /// // Reporter runs in the background...
    ///
    /// drop(reporter);
    /// ```
    pub fn start(space: Arc<TupleSpace>, config: ReporterConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);

        tokio::spawn(reporter_loop(space, config, shutdown_rx, snapshot_tx));

        info!("Stats reporter started");

        Self {
            shutdown_tx,
            snapshot_rx,
        }
    }

    /// Returns a receiver that sees every snapshot the reporter takes.
    pub fn subscribe(&self) -> watch::Receiver<Option<StatsSnapshot>> {
        self.snapshot_rx.clone()
    }

    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for StatsReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn reporter_loop(
    space: Arc<TupleSpace>,
    config: ReporterConfig,
    mut shutdown_rx: watch::Receiver<bool>,
    snapshot_tx: watch::Sender<Option<StatsSnapshot>>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    info!("Stats reporter interrupted");
                    return;
                }
            }
        }

        let snap = space.snapshot();
        info!("\n{}", snap);
        debug!(
            tuples = snap.tuple_count,
            avg_tuple_size = %format!("{:.2}", snap.avg_tuple_size),
            avg_key_size = %format!("{:.2}", snap.avg_key_size),
            avg_value_size = %format!("{:.2}", snap.avg_value_size),
            clients = snap.connections_accepted,
            active_clients = snap.active_connections,
            rejected_clients = snap.connections_rejected,
            total_ops = snap.total_ops,
            puts = snap.puts,
            gets = snap.gets,
            reads = snap.reads,
            errors = snap.errors,
            "Tuple space statistics"
        );
        snapshot_tx.send_replace(Some(snap));
    }
}
