//! Connection Handler
//!
//! Each client gets its own handler task that runs in a loop, reading
//! request lines and sending response lines.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client admitted by the listener
//!        │
//!        ▼
//! 2. ConnectionHandler spawned (Open)
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │  Take a line from buffer     │
//!    │  (read more if none yet)     │
//!    │              │               │
//!    │              ▼               │
//!    │  Decode + execute            │
//!    │              │               │
//!    │              ▼               │
//!    │  Write + flush response      │
//!    │              │               │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. End of stream / I/O error (Closed)
//! ```
//!
//! ## Buffer Management
//!
//! TCP is a stream protocol. A read may hold half a line or several lines,
//! so incoming bytes accumulate in a `BytesMut` and complete lines are split
//! off the front. Bytes left over at end of stream form one last line.

use crate::commands::{CommandHandler, Reply};
use crate::protocol::{decode_line, parse_line, INVALID_FORMAT_FRAME};
use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, trace, warn};

/// Maximum bytes buffered without seeing a newline (64 KB)
const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Handles a single client connection.
///
/// Generic over the stream so tests can drive it without a socket.
pub struct ConnectionHandler<S> {
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Bytes received but not yet consumed as lines
    buffer: BytesMut,

    /// Encoded response waiting to be written
    out: Vec<u8>,

    command_handler: CommandHandler,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, addr: SocketAddr, command_handler: CommandHandler) -> Self {
        command_handler.space().counters().connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            out: Vec::with_capacity(128),
            command_handler,
        }
    }

    /// Serves the client until it disconnects or an I/O error occurs.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected"),
            Err(ConnectionError::Io(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Client disconnected unexpectedly"),
        }

        self.command_handler.space().counters().connection_closed();
        result
    }

    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(line) = self.next_line() {
                self.respond(&line).await?;
            }

            if self.read_more_data().await? == 0 {
                // An unterminated last line still counts as a request.
                if !self.buffer.is_empty() {
                    let rest = self.buffer.split();
                    let line = decode_line(&rest);
                    self.respond(&line).await?;
                }
                return Ok(());
            }
        }
    }

    /// Splits the next complete line off the buffer, if there is one.
    fn next_line(&mut self) -> Option<String> {
        let (line, consumed) = parse_line(&self.buffer)?;
        let _ = self.buffer.split_to(consumed);
        trace!(
            client = %self.addr,
            consumed = consumed,
            remaining = self.buffer.len(),
            "Parsed line"
        );
        Some(line)
    }

    /// Reads more data from the socket. Returns 0 at end of stream.
    async fn read_more_data(&mut self) -> Result<usize, ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;
        trace!(client = %self.addr, bytes = n, "Read data");
        Ok(n)
    }

    async fn respond(&mut self, line: &str) -> Result<(), ConnectionError> {
        self.out.clear();
        match self.command_handler.handle_line(line) {
            Reply::Response(response) => {
                debug!(client = %self.addr, request = line, response = %response, "Handled request");
                response.serialize_into(&mut self.out);
            }
            Reply::InvalidFormat => {
                debug!(client = %self.addr, request = line, "Invalid request format");
                self.out.extend_from_slice(INVALID_FORMAT_FRAME);
            }
        }

        self.stream.write_all(&self.out).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line grew past the buffer limit without a newline
    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Handles a client connection to completion.
///
/// Errors are logged by the handler itself; nothing is returned because no
/// failure of one connection concerns any other.
pub async fn handle_connection<S>(stream: S, addr: SocketAddr, command_handler: CommandHandler)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, command_handler);
    let _ = handler.run().await;
}
