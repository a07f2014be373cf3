//! Client for the tuple space server.
//!
//! Sends request frames and reads the matching response lines. Also runs
//! request scripts: plain text files with one `PUT key value`, `GET key` or
//! `READ key` command per line.

use crate::protocol::{decode_line, decode_response, ParseError, Request, ResponseFrame};
use std::io::Write;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

/// Longest `key + " " + value` a script command may carry.
pub const MAX_PAYLOAD_CHARS: usize = 970;

/// A script line rejected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("exceeds 970 characters, ignored.")]
    TooLong,

    #[error("unknown command {0}")]
    UnknownCommand(String),
}

/// Errors talking to the server.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    #[error("server closed the connection")]
    ConnectionClosed,
}

/// Parses one script line into a request.
///
/// Blank lines yield `Ok(None)`. The line is split on its first two spaces,
/// so a value may itself contain spaces.
pub fn parse_script_line(line: &str) -> Result<Option<Request>, ScriptError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut fields = line.splitn(3, ' ');
    let command = fields.next().unwrap_or_default();
    let key = fields.next().unwrap_or_default();
    let value = fields.next().unwrap_or_default();

    if key.chars().count() + 1 + value.chars().count() > MAX_PAYLOAD_CHARS {
        return Err(ScriptError::TooLong);
    }

    let request = match command {
        "PUT" => Request::put(key, value),
        "GET" => Request::get(key),
        "READ" => Request::read(key),
        other => return Err(ScriptError::UnknownCommand(other.to_string())),
    };
    Ok(Some(request))
}

/// Counts from one script run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    /// Requests sent and answered
    pub sent: usize,
    /// Lines rejected locally
    pub rejected: usize,
}

/// A connection to a tuple space server.
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    line: Vec<u8>,
}

impl Client {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            line: Vec::new(),
        })
    }

    /// Sends one request and returns the raw response line, header included.
    pub async fn send(&mut self, request: &Request) -> Result<String, ClientError> {
        self.writer.write_all(&request.serialize()).await?;
        self.writer.flush().await?;

        self.line.clear();
        let n = self.reader.read_until(b'\n', &mut self.line).await?;
        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }
        let line = self.line.strip_suffix(b"\n").unwrap_or(&self.line);
        Ok(decode_line(line))
    }

    /// Sends one request and decodes the response frame.
    pub async fn request(&mut self, request: &Request) -> Result<ResponseFrame, ClientError> {
        let line = self.send(request).await?;
        Ok(decode_response(&line)?)
    }

    pub async fn put(&mut self, key: &str, value: &str) -> Result<ResponseFrame, ClientError> {
        self.request(&Request::put(key, value)).await
    }

    pub async fn get(&mut self, key: &str) -> Result<ResponseFrame, ClientError> {
        self.request(&Request::get(key)).await
    }

    pub async fn read(&mut self, key: &str) -> Result<ResponseFrame, ClientError> {
        self.request(&Request::read(key)).await
    }

    /// Runs every line of `script`, writing `<line>: <result>` to `out`.
    ///
    /// Rejected lines are reported to `out` and never reach the server.
    pub async fn run_script<W: Write>(
        &mut self,
        script: &str,
        out: &mut W,
    ) -> Result<ScriptSummary, ClientError> {
        let mut summary = ScriptSummary::default();

        for raw in script.lines() {
            let line = raw.trim();
            match parse_script_line(line) {
                Ok(None) => {}
                Ok(Some(request)) => {
                    let response = self.send(&request).await?;
                    debug!(request = line, response = %response, "Script request");
                    writeln!(out, "{}: {}", line, response)?;
                    summary.sent += 1;
                }
                Err(e) => {
                    writeln!(out, "{}: ERROR - {}", line, e)?;
                    summary.rejected += 1;
                }
            }
        }

        Ok(summary)
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Server;
    use crate::space::TupleSpace;
    use std::net::SocketAddr;
    use std::sync::Arc;

    async fn start_server() -> SocketAddr {
        let server = Server::bind("127.0.0.1:0", Arc::new(TupleSpace::new()), 10)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());
        addr
    }

    #[test]
    fn test_parse_script_line() {
        assert_eq!(parse_script_line("PUT a 1"), Ok(Some(Request::put("a", "1"))));
        assert_eq!(
            parse_script_line("  PUT name Ariz Vega "),
            Ok(Some(Request::put("name", "Ariz Vega")))
        );
        assert_eq!(parse_script_line("GET a"), Ok(Some(Request::get("a"))));
        assert_eq!(parse_script_line("READ a extra"), Ok(Some(Request::read("a"))));
        assert_eq!(parse_script_line("   "), Ok(None));
        assert_eq!(
            parse_script_line("DEL a"),
            Err(ScriptError::UnknownCommand("DEL".into()))
        );
    }

    #[test]
    fn test_payload_limit() {
        // key + " " + value = 970 characters: allowed
        let value = "v".repeat(968);
        assert!(parse_script_line(&format!("PUT k {}", value)).is_ok());

        let value = "v".repeat(969);
        assert_eq!(
            parse_script_line(&format!("PUT k {}", value)),
            Err(ScriptError::TooLong)
        );

        // GET counts the separator too
        let key = "k".repeat(970);
        assert_eq!(
            parse_script_line(&format!("GET {}", key)),
            Err(ScriptError::TooLong)
        );
    }

    #[tokio::test]
    async fn test_client_round_trip() {
        let addr = start_server().await;
        let mut client = Client::connect(addr).await.unwrap();

        let frame = client.put("a", "1").await.unwrap();
        assert_eq!(frame.status, "OK (a, 1) added");
        assert_eq!(frame.declared_len, 19);

        assert_eq!(client.read("a").await.unwrap().status, "OK (a, 1) read");
        assert_eq!(client.get("a").await.unwrap().status, "OK (a, 1) removed");

        let frame = client.get("a").await.unwrap();
        assert!(!frame.is_ok());
        assert_eq!(frame.status, "ERR a does not exist");

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_script() {
        let addr = start_server().await;
        let mut client = Client::connect(addr).await.unwrap();
        let too_long = format!("PUT big {}", "x".repeat(1000));
        let script = format!(
            "PUT a 1\n\nPUT a 2\nREAD a\nPOP a\n{}\nGET a\nGET a\n",
            too_long
        );

        let mut out = Vec::new();
        let summary = client.run_script(&script, &mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(summary, ScriptSummary { sent: 5, rejected: 2 });
        assert_eq!(
            lines,
            vec![
                "PUT a 1: 019 OK (a, 1) added".to_string(),
                "PUT a 2: 024 ERR a already exists".to_string(),
                "READ a: 018 OK (a, 1) read".to_string(),
                "POP a: ERROR - unknown command POP".to_string(),
                format!("{}: ERROR - exceeds 970 characters, ignored.", too_long),
                "GET a: 021 OK (a, 1) removed".to_string(),
                "GET a: 024 ERR a does not exist".to_string(),
            ]
        );
    }
}
