//! Connection Handler
//!
//! Each client gets its own task. The task reads bytes into a growing
//! buffer, answers every complete request the buffer holds, flushes the
//! batch of replies in one write and reads again.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects            (stats: accepted += 1, active += 1)
//!        │
//!        ▼
//! 2. ┌──────────────────────────────────┐
//!    │  Answer every buffered request   │◄──┐
//!    │  Flush the batch of replies      │   │
//!    │  Read more (buffer grows ×2)     │───┘
//!    └──────────────────────────────────┘
//!        │
//!        ▼
//! 3. EOF / protocol error / oversized request / I/O error
//!                               (stats: active -= 1)
//! ```
//!
//! A request may span many reads, so the buffer is allowed to grow until it
//! holds one whole request. The limit is [`MAX_REQUEST_SIZE`], sized so a
//! maximal bulk string still fits. Growth is geometric, which keeps the
//! number of re-parses of a large request logarithmic in its size.

use crate::commands::CommandHandler;
use crate::protocol::parser::MAX_BULK_SIZE;
use crate::protocol::{ParseError, RespParser, RespValue};
use bytes::{Buf, BytesMut};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

/// Largest request a client may send: one maximal bulk string plus headroom
/// for the array header, the command name and the key.
pub const MAX_REQUEST_SIZE: usize = MAX_BULK_SIZE + 64 * 1024;

/// Smallest read reservation
const READ_CHUNK: usize = 4096;

/// Server-wide counters, shared by every connection task.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    accepted: AtomicU64,
    active: AtomicU64,
    commands: AtomicU64,
    protocol_errors: AtomicU64,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
}

/// A point-in-time copy of [`ConnectionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub active: u64,
    pub commands: u64,
    pub protocol_errors: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            commands: self.commands.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
        }
    }

    /// Registers a new client. The client counts as active until the
    /// returned guard is dropped.
    fn open(self: &Arc<Self>) -> ActiveGuard {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
        ActiveGuard(Arc::clone(self))
    }

    fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
}

struct ActiveGuard(Arc<ConnectionStats>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes on the wire are not RESP; framing is lost
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    #[error("request of {size} bytes exceeds the {limit} byte limit")]
    RequestTooLarge { size: usize, limit: usize },

    /// The client hung up in the middle of a request
    #[error("client closed the stream with {pending} bytes of an unfinished request")]
    Truncated { pending: usize },
}

/// One client session.
pub struct Connection {
    addr: SocketAddr,
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    /// Unparsed request bytes
    inbound: BytesMut,
    /// Replies waiting for the next flush
    outbound: Vec<u8>,
    parser: RespParser,
    commands: CommandHandler,
    stats: Arc<ConnectionStats>,
    request_limit: usize,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        commands: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            addr,
            reader,
            writer,
            inbound: BytesMut::with_capacity(READ_CHUNK),
            outbound: Vec::new(),
            parser: RespParser::new(),
            commands,
            stats,
            request_limit: MAX_REQUEST_SIZE,
        }
    }

    /// Overrides [`MAX_REQUEST_SIZE`] for this connection.
    pub fn with_request_limit(mut self, limit: usize) -> Self {
        self.request_limit = limit;
        self
    }

    /// Serves the client until it disconnects. A clean hang-up between
    /// requests is `Ok(())`.
    pub async fn serve(mut self) -> Result<(), ConnectionError> {
        let _active = self.stats.open();
        info!(client = %self.addr, "Client connected");

        loop {
            let answered = self.answer_buffered();
            self.flush().await?;
            answered?;

            if !self.fill_inbound().await? {
                info!(client = %self.addr, "Client disconnected");
                return Ok(());
            }
        }
    }

    /// Answers every complete request at the front of the buffer, queueing
    /// the replies. On a protocol error the error reply is queued last and
    /// the error returned, so the caller flushes it before closing.
    fn answer_buffered(&mut self) -> Result<(), ConnectionError> {
        while !self.inbound.is_empty() {
            match self.parser.parse(&self.inbound) {
                Ok(Some((request, consumed))) => {
                    self.inbound.advance(consumed);
                    let reply = self.commands.execute(request);
                    reply.serialize_into(&mut self.outbound);
                    ConnectionStats::add(&self.stats.commands, 1);
                }
                Ok(None) => {
                    trace!(
                        client = %self.addr,
                        buffered = self.inbound.len(),
                        "Waiting for the rest of a request"
                    );
                    break;
                }
                Err(e) => {
                    self.refuse(format!("ERR Protocol error: {}", e));
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Reads more request bytes. Returns `false` when the client closed the
    /// stream with nothing pending.
    async fn fill_inbound(&mut self) -> Result<bool, ConnectionError> {
        let size = self.inbound.len();
        if size >= self.request_limit {
            let limit = self.request_limit;
            self.refuse(format!(
                "ERR Protocol error: request exceeds {} bytes",
                limit
            ));
            self.flush().await?;
            return Err(ConnectionError::RequestTooLarge { size, limit });
        }

        let want = size.max(READ_CHUNK).min(self.request_limit - size);
        self.inbound.reserve(want);

        let n = self.reader.read_buf(&mut self.inbound).await?;
        if n == 0 {
            return match self.inbound.len() {
                0 => Ok(false),
                pending => Err(ConnectionError::Truncated { pending }),
            };
        }

        ConnectionStats::add(&self.stats.bytes_in, n);
        trace!(client = %self.addr, bytes = n, "Read");
        Ok(true)
    }

    /// Queues a final error reply for a client whose stream can no longer
    /// be framed.
    fn refuse(&mut self, message: String) {
        warn!(client = %self.addr, reason = %message, "Refusing client");
        ConnectionStats::add(&self.stats.protocol_errors, 1);
        RespValue::error(message).serialize_into(&mut self.outbound);
    }

    async fn flush(&mut self) -> Result<(), ConnectionError> {
        if self.outbound.is_empty() {
            return Ok(());
        }
        self.writer.write_all(&self.outbound).await?;
        ConnectionStats::add(&self.stats.bytes_out, self.outbound.len());
        trace!(client = %self.addr, bytes = self.outbound.len(), "Flushed replies");
        self.outbound.clear();
        Ok(())
    }
}

/// Serves one accepted client to completion, logging how it ended.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    commands: CommandHandler,
    stats: Arc<ConnectionStats>,
) {
    let result = Connection::new(stream, addr, commands, stats).serve().await;
    match result {
        Ok(()) => {}
        Err(ConnectionError::Io(e)) if e.kind() == std::io::ErrorKind::ConnectionReset => {
            debug!(client = %addr, "Connection reset by client")
        }
        Err(e) => warn!(client = %addr, error = %e, "Connection closed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{HashStore, StringStore};
    use tokio::net::TcpListener;
    use tokio::time::{sleep, timeout, Duration};

    /// Starts a server on a loopback port. `limit` overrides the request
    /// size limit for every connection.
    async fn spawn_server(limit: Option<usize>) -> (SocketAddr, Arc<ConnectionStats>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = Arc::new(ConnectionStats::new());
        let commands =
            CommandHandler::new(Arc::new(StringStore::new()), Arc::new(HashStore::new()));

        let server_stats = Arc::clone(&stats);
        tokio::spawn(async move {
            while let Ok((stream, client_addr)) = listener.accept().await {
                let mut conn = Connection::new(
                    stream,
                    client_addr,
                    commands.clone(),
                    Arc::clone(&server_stats),
                );
                if let Some(limit) = limit {
                    conn = conn.with_request_limit(limit);
                }
                tokio::spawn(async move {
                    let _ = conn.serve().await;
                });
            }
        });

        (addr, stats)
    }

    async fn create_test_server() -> (SocketAddr, Arc<ConnectionStats>) {
        spawn_server(None).await
    }

    /// Reads until exactly `expected.len()` bytes have arrived.
    async fn read_exact_reply(client: &mut TcpStream, expected: &[u8]) {
        let mut buf = vec![0u8; expected.len()];
        timeout(Duration::from_secs(5), client.read_exact(&mut buf))
            .await
            .expect("timed out waiting for reply")
            .unwrap();
        assert_eq!(
            String::from_utf8_lossy(&buf),
            String::from_utf8_lossy(expected)
        );
    }

    /// Collects everything the server sends until it closes the socket.
    async fn read_until_closed(client: &mut TcpStream) -> String {
        let mut received = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let read = timeout(Duration::from_secs(2), client.read(&mut chunk))
                .await
                .expect("server did not close the connection");
            match read {
                Ok(0) | Err(_) => break,
                Ok(n) => received.extend_from_slice(&chunk[..n]),
            }
        }
        String::from_utf8_lossy(&received).into_owned()
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let (addr, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        read_exact_reply(&mut client, b"+PONG\r\n").await;
    }

    #[tokio::test]
    async fn test_set_get() {
        let (addr, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client
            .write_all(b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$4\r\nAriz\r\n")
            .await
            .unwrap();
        read_exact_reply(&mut client, b"+OK\r\n").await;

        client
            .write_all(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
            .await
            .unwrap();
        read_exact_reply(&mut client, b"$4\r\nAriz\r\n").await;
    }

    #[tokio::test]
    async fn test_value_larger_than_initial_buffer() {
        let (addr, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        let value = vec![b'x'; 70 * 1024];
        let mut request = format!("*3\r\n$3\r\nSET\r\n$1\r\nk\r\n${}\r\n", value.len()).into_bytes();
        request.extend_from_slice(&value);
        request.extend_from_slice(b"\r\n");

        client.write_all(&request).await.unwrap();
        read_exact_reply(&mut client, b"+OK\r\n").await;

        client.write_all(b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n").await.unwrap();
        let mut expected = format!("${}\r\n", value.len()).into_bytes();
        expected.extend_from_slice(&value);
        expected.extend_from_slice(b"\r\n");
        read_exact_reply(&mut client, &expected).await;
    }

    #[tokio::test]
    async fn test_oversized_request_is_refused_with_error() {
        let (addr, stats) = spawn_server(Some(1024)).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        // Announces 5000 bytes but sends 1500; the buffer passes the limit
        // before the request completes.
        let mut request = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$5000\r\n".to_vec();
        request.extend_from_slice(&[b'x'; 1500]);
        client.write_all(&request).await.unwrap();

        let reply = read_until_closed(&mut client).await;
        assert_eq!(reply, "-ERR Protocol error: request exceeds 1024 bytes\r\n");

        sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.snapshot().protocol_errors, 1);
        assert_eq!(stats.snapshot().commands, 0);
    }

    #[tokio::test]
    async fn test_pipelined_commands() {
        let (addr, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client
            .write_all(
                b"*2\r\n$4\r\nINCR\r\n$1\r\nn\r\n\
                  *2\r\n$4\r\nINCR\r\n$1\r\nn\r\n\
                  *4\r\n$4\r\nHSET\r\n$1\r\nh\r\n$1\r\nf\r\n$1\r\nv\r\n\
                  *3\r\n$4\r\nMGET\r\n$1\r\nn\r\n$1\r\nx\r\n",
            )
            .await
            .unwrap();

        read_exact_reply(
            &mut client,
            b"$1\r\n1\r\n$1\r\n2\r\n+OK\r\n*2\r\n$1\r\n2\r\n$-1\r\n",
        )
        .await;
    }

    #[tokio::test]
    async fn test_request_split_across_writes() {
        let (addr, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"*2\r\n$3\r\nGE").await.unwrap();
        client.flush().await.unwrap();
        sleep(Duration::from_millis(20)).await;
        client.write_all(b"T\r\n$4\r\nnone\r\n").await.unwrap();

        read_exact_reply(&mut client, b"$-1\r\n").await;
    }

    #[tokio::test]
    async fn test_inline_command() {
        let (addr, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"DECR fresh\r\n").await.unwrap();
        read_exact_reply(&mut client, b"$1\r\n1\r\n").await;
    }

    #[tokio::test]
    async fn test_command_error_keeps_connection_open() {
        let (addr, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"*2\r\n$3\r\nSET\r\n$1\r\nk\r\n").await.unwrap();
        read_exact_reply(
            &mut client,
            b"-ERR wrong number of arguments for 'SET' command\r\n",
        )
        .await;

        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        read_exact_reply(&mut client, b"+PONG\r\n").await;
    }

    #[tokio::test]
    async fn test_protocol_error_answers_earlier_requests_then_closes() {
        let (addr, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"*1\r\n$4\r\nPING\r\n$abc\r\n").await.unwrap();

        let reply = read_until_closed(&mut client).await;
        assert!(reply.starts_with("+PONG\r\n-ERR Protocol error"), "got {reply}");
    }

    #[tokio::test]
    async fn test_connection_stats() {
        let (addr, stats) = create_test_server().await;
        assert_eq!(stats.snapshot(), StatsSnapshot::default());

        let mut client = TcpStream::connect(addr).await.unwrap();
        sleep(Duration::from_millis(50)).await;

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.accepted, 1);
        assert_eq!(snapshot.active, 1);

        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        read_exact_reply(&mut client, b"+PONG\r\n").await;
        sleep(Duration::from_millis(50)).await;

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.commands, 1);
        assert_eq!(snapshot.bytes_in, 14);
        assert_eq!(snapshot.bytes_out, 7);

        drop(client);
        sleep(Duration::from_millis(50)).await;

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.active, 0);
        assert_eq!(snapshot.accepted, 1);
        assert_eq!(snapshot.protocol_errors, 0);
    }
}
