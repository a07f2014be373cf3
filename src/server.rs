//! TCP listener and admission control.
//!
//! The accept loop never waits for capacity. Each accepted socket either
//! gets a permit from a fixed-size semaphore and is served on its own task,
//! or is handed to a short-lived task that sends the busy reply and closes
//! it. Overload therefore produces refusals instead of an ever-growing queue
//! of waiting clients.

use crate::commands::CommandHandler;
use crate::connection::handle_connection;
use crate::protocol::Response;
use crate::space::TupleSpace;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Upper bound on the time spent turning away one connection
const REFUSAL_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause after a failed accept, so persistent errors such as running out
/// of file descriptors do not spin the loop
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A bound tuple space server.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    space: Arc<TupleSpace>,
    /// One permit per client that may be served at once
    admission: Arc<Semaphore>,
}

impl Server {
    /// Binds the listening socket.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        space: Arc<TupleSpace>,
        max_clients: usize,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::from_listener(listener, space, max_clients))
    }

    pub fn from_listener(listener: TcpListener, space: Arc<TupleSpace>, max_clients: usize) -> Self {
        Self {
            listener,
            space,
            admission: Arc::new(Semaphore::new(max_clients)),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn space(&self) -> &Arc<TupleSpace> {
        &self.space
    }

    /// Runs the accept loop forever.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.admit(stream, addr),
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }
    }

    fn admit(&self, stream: TcpStream, addr: SocketAddr) {
        match Arc::clone(&self.admission).try_acquire_owned() {
            Ok(permit) => {
                debug!(client = %addr, available = self.admission.available_permits(), "Admitted");
                let handler = CommandHandler::new(Arc::clone(&self.space));

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler).await;
                    drop(permit);
                });
            }
            Err(_) => {
                self.space.counters().connection_rejected();
                warn!(client = %addr, "Client limit reached, rejecting connection");
                tokio::spawn(refuse(stream, addr));
            }
        }
    }
}

/// Sends the busy reply and closes the connection.
///
/// Input the client sent before reading is drained until it closes its side.
/// Closing a socket with unread data resets the connection, and the reset
/// would discard the reply before the client reads it.
async fn refuse(mut stream: TcpStream, addr: SocketAddr) {
    let result = tokio::time::timeout(REFUSAL_TIMEOUT, async {
        stream.write_all(&Response::server_busy().serialize()).await?;
        stream.shutdown().await?;

        let mut discard = [0u8; 1024];
        while stream.read(&mut discard).await? != 0 {}
        Ok::<_, io::Error>(())
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(client = %addr, error = %e, "Could not send busy reply"),
        Err(_) => debug!(client = %addr, "Busy reply timed out"),
    }
}
