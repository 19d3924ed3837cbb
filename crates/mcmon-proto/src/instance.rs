//! One memcached instance and its connection.
//!
//! The connection lifecycle is explicit: `Unopened` until the first
//! command, `Open` while in use, `Closed` after `close()`. An `Instance`
//! is built per polling cycle and never reused.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ProtoError, ProtoResult};
use crate::parse;
use crate::types::{KeyDetail, RawStats};

/// Multi-line responses end with this token. The match is on the literal
/// byte sequence anywhere in the stream, mirroring the loose telnet-style
/// read-until the protocol has always been scraped with.
const SENTINEL: &[u8] = b"END";

enum ConnState {
    Unopened,
    Open(TcpStream),
    Closed,
}

/// A client for one cache instance, identified by host and port.
pub struct Instance {
    host: String,
    port: u16,
    timeout: Duration,
    conn: ConnState,
    /// Bytes read past the previous response's sentinel, replayed at the
    /// start of the next response.
    pending: Vec<u8>,
}

impl Instance {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            conn: ConnState::Unopened,
            pending: Vec::new(),
        }
    }

    /// Lazily open the connection, bounded by the configured timeout.
    async fn stream(&mut self) -> ProtoResult<&mut TcpStream> {
        if matches!(self.conn, ConnState::Unopened) {
            debug!(host = %self.host, port = self.port, "create connection");
            let connect = TcpStream::connect((self.host.as_str(), self.port));
            let stream = match timeout(self.timeout, connect).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => return Err(ProtoError::Connect(e)),
                Err(_) => {
                    return Err(ProtoError::Connect(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "connect timed out",
                    )));
                }
            };
            self.conn = ConnState::Open(stream);
        }
        match &mut self.conn {
            ConnState::Open(stream) => Ok(stream),
            _ => Err(ProtoError::Protocol("connection already closed".to_string())),
        }
    }

    /// Issue a command and read the response through the `END` sentinel,
    /// inclusive. A line terminator is appended if the command lacks one.
    pub async fn command(&mut self, cmd: &str) -> ProtoResult<String> {
        debug!(%cmd, port = self.port, "issue command");
        let mut line = cmd.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        let io_timeout = self.timeout;
        let carry = std::mem::take(&mut self.pending);
        let stream = self.stream().await?;

        match timeout(io_timeout, stream.write_all(line.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ProtoError::Protocol(format!("write failed: {e}"))),
            Err(_) => return Err(ProtoError::Timeout(io_timeout)),
        }

        let (response, leftover) = read_until_sentinel(stream, carry, io_timeout).await?;
        self.pending = leftover;
        Ok(response)
    }

    /// Best-effort `quit`. Never fails the caller; the connection is
    /// considered closed regardless of the write outcome.
    pub async fn close(&mut self) {
        if let ConnState::Open(stream) = &mut self.conn {
            match timeout(self.timeout, stream.write_all(b"quit\n")).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(port = self.port, error = %e, "quit write failed"),
                Err(_) => debug!(port = self.port, "quit write timed out"),
            }
        }
        self.conn = ConnState::Closed;
        self.pending.clear();
    }

    /// Fetch the instance's stat map via the `stats` command.
    ///
    /// Lines that do not fit the `STAT <name> <number>` grammar are
    /// silently skipped.
    pub async fn stats(&mut self) -> ProtoResult<RawStats> {
        let response = self.command("stats").await?;
        Ok(response.lines().filter_map(parse::stat_line).collect())
    }

    /// Slab ids currently in use, in encounter order. Duplicates are
    /// possible when the server reports decorated per-class fields.
    pub async fn slab_ids(&mut self) -> ProtoResult<Vec<u32>> {
        let response = self.command("stats items").await?;
        Ok(response.lines().filter_map(parse::slab_line).collect())
    }

    /// Dump up to `limit` keys per slab and flatten across all slabs.
    /// With `sort`, the result is stably ordered by key name.
    pub async fn key_details(&mut self, limit: u32, sort: bool) -> ProtoResult<Vec<KeyDetail>> {
        let ids = self.slab_ids().await?;
        let mut details = Vec::new();
        for id in ids {
            let response = self.command(&format!("stats cachedump {id} {limit}")).await?;
            details.extend(response.lines().filter_map(parse::item_line));
        }
        if sort {
            details.sort_by(|a, b| a.key.cmp(&b.key));
        }
        Ok(details)
    }

    /// Key names in use, sorted.
    pub async fn keys(&mut self, limit: u32) -> ProtoResult<Vec<String>> {
        let details = self.key_details(limit, true).await?;
        Ok(details.into_iter().map(|d| d.key).collect())
    }
}

/// Read from the stream until the sentinel appears, starting from any
/// carried-over bytes. Returns the response (through the sentinel) and
/// the bytes read past it.
async fn read_until_sentinel(
    stream: &mut TcpStream,
    carry: Vec<u8>,
    io_timeout: Duration,
) -> ProtoResult<(String, Vec<u8>)> {
    let mut buf = carry;
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(end) = find_sentinel(&buf) {
            let leftover = buf.split_off(end);
            return Ok((String::from_utf8_lossy(&buf).into_owned(), leftover));
        }
        let n = match timeout(io_timeout, stream.read(&mut chunk)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(ProtoError::Protocol(format!("read failed: {e}"))),
            Err(_) => return Err(ProtoError::Timeout(io_timeout)),
        };
        if n == 0 {
            return Err(ProtoError::Protocol(
                "stream closed before END sentinel".to_string(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Offset one past the sentinel, if present.
fn find_sentinel(buf: &[u8]) -> Option<usize> {
    buf.windows(SENTINEL.len())
        .position(|w| w == SENTINEL)
        .map(|pos| pos + SENTINEL.len())
}
