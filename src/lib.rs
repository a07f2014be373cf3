//! # tuplespace - A Minimal Shared-Memory Tuple Space
//!
//! A single server process holds a set of `(key, value)` tuples and serves
//! them over a newline-delimited, length-prefixed TCP protocol. Any number
//! of clients connect at once and insert, take or peek at tuples by key.
//!
//! ## Operations
//!
//! - **PUT** (`P`): insert a tuple if its key is absent
//! - **GET** (`G`): remove a tuple and return it
//! - **READ** (`R`): return a tuple without removing it
//!
//! Every operation fails immediately when its precondition does not hold.
//! Nothing ever waits for a tuple to appear.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              tuplespace                                 │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (admission) │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │   Line      │    │   TupleSpace (TupleStore + OpCounters)       │   │
//! │  │   Codec     │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │             │    │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │  └─────────────┘    │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! │                                               ▲                         │
//! │                                               │                         │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     │           StatsReporter                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use tuplespace::server::Server;
//! use tuplespace::space::TupleSpace;
//! use tuplespace::stats::{ReporterConfig, StatsReporter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let space = Arc::new(TupleSpace::new());
//!     let _reporter = StatsReporter::start(Arc::clone(&space), ReporterConfig::default());
//!
//!     let server = Server::bind("0.0.0.0:51234", space, 100).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: sharded tuple store with atomic put / get / read
//! - [`protocol`]: request and response frames
//! - [`space`]: the service object owning the store and counters
//! - [`commands`]: request dispatch
//! - [`connection`]: per-client read / execute / respond loop
//! - [`server`]: accept loop with admission control
//! - [`stats`]: counters, snapshots and the periodic reporter
//! - [`client`]: client connection and script runner
//! - [`config`]: server command-line options

pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod space;
pub mod stats;
pub mod storage;

pub use client::Client;
pub use commands::CommandHandler;
pub use config::ServerConfig;
pub use protocol::{Request, Response};
pub use server::Server;
pub use space::TupleSpace;
pub use stats::{StatsReporter, StatsSnapshot};
pub use storage::{Outcome, StoreError, Tuple, TupleStore};

/// Version of tuplespace
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
