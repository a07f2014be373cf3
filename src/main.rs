//! tuplespace - server entry point
//!
//! Parses the command line, builds the shared tuple space, starts the stats
//! reporter and runs the accept loop until Ctrl+C.

use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tuplespace::config::{CliAction, ServerConfig, USAGE};
use tuplespace::server::Server;
use tuplespace::space::TupleSpace;
use tuplespace::stats::{ReporterConfig, StatsReporter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match ServerConfig::from_args(std::env::args().skip(1)) {
        Ok(CliAction::Serve(config)) => config,
        Ok(CliAction::Help) => {
            println!("tuplespace - shared-memory tuple space server\n\n{}", USAGE);
            return Ok(());
        }
        Ok(CliAction::Version) => {
            println!("tuplespace version {}", tuplespace::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let space = Arc::new(TupleSpace::new());

    let server = Server::bind(config.bind_address(), Arc::clone(&space), config.max_clients)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    println!("Server started on port {}", server.local_addr()?.port());
    info!(
        addr = %config.bind_address(),
        max_clients = config.max_clients,
        "Tuple space server listening"
    );

    let _reporter = StatsReporter::start(
        Arc::clone(server.space()),
        ReporterConfig {
            interval: config.stats_interval,
        },
    );

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = server.run() => {}
        _ = shutdown => {}
    }

    info!("Server shutdown complete");
    Ok(())
}
