//! tuplespace-client - runs a request script against a server
//!
//! Usage: `tuplespace-client <host> <port> <request-file>`

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;
use tuplespace::client::Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [host, port, file] = args.as_slice() else {
        eprintln!("Usage: tuplespace-client <host> <port> <request-file>");
        std::process::exit(1);
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let port: u16 = match port.parse() {
        Ok(port) => port,
        Err(_) => bail!("invalid port number: {}", port),
    };

    let script = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read request file {}", file))?;

    let mut client = Client::connect((host.as_str(), port))
        .await
        .with_context(|| format!("failed to connect to {}:{}", host, port))?;

    let mut stdout = std::io::stdout().lock();
    let summary = client.run_script(&script, &mut stdout).await?;
    tracing::info!(sent = summary.sent, rejected = summary.rejected, "Script finished");

    client.close().await?;
    Ok(())
}
