//! Per-client reader loop.
//!
//! Bytes from the socket pile up in a `BytesMut` until the decoder can take
//! one whole command off the front. A single read may hold part of a command
//! or several pipelined ones, so the loop drains every complete command
//! before it reads again. Each command goes to the connection's executor and
//! its reply is written and flushed before the next command is submitted.

use crate::commands::CommandHandler;
use crate::connection::executor::{ExecutorClosed, ExecutorHandle};
use crate::protocol::{Decoded, ParseError, Reply, RespParser};
use bytes::{Buf, BytesMut};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Unparsed input allowed per connection before it is dropped (64 MiB).
const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

const READ_CHUNK: usize = 4096;

/// Server-wide connection counters, shared by every connection task.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub connections_accepted: AtomicU64,
    pub active_connections: AtomicU64,
    pub commands_processed: AtomicU64,
    pub bytes_read: AtomicU64,
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// One client: its socket, input buffer and executor.
pub struct ConnectionHandler {
    stream: BufWriter<TcpStream>,
    addr: SocketAddr,
    /// Bytes read but not yet decoded
    buffer: BytesMut,
    executor: ExecutorHandle,
    parser: RespParser,
    stats: Arc<ConnectionStats>,
    idle_timeout: Option<Duration>,
}

impl ConnectionHandler {
    /// Wraps an accepted socket and starts its executor task.
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
        idle_timeout: Option<Duration>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            executor: ExecutorHandle::spawn(command_handler),
            parser: RespParser::new(),
            stats,
            idle_timeout,
        }
    }

    /// Serves the client until it hangs up or the connection has to be dropped.
    ///
    /// Dropping `self` on return also stops the executor task.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.serve_commands().await;
        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected"),
            Err(e) if e.is_hangup() => debug!(client = %self.addr, error = %e, "Client went away"),
            Err(e) => warn!(client = %self.addr, error = %e, "Closing connection"),
        }

        self.stats.connection_closed();
        result
    }

    async fn serve_commands(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(decoded) = self.next_decoded()? {
                let Decoded::Command(command) = decoded else {
                    trace!(client = %self.addr, "Nothing to execute");
                    continue;
                };

                debug!(
                    client = %self.addr,
                    command = %command.name,
                    args = command.args.len(),
                    "Received command"
                );

                let reply = self.executor.submit(command).await?;
                self.stats.command_processed();
                self.write_reply(&reply).await?;
            }

            self.fill_buffer().await?;
        }
    }

    /// Takes one decoded unit off the front of the buffer, if a whole one is there.
    fn next_decoded(&mut self) -> Result<Option<Decoded>, ConnectionError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match self.parser.parse(&self.buffer)? {
            Some((decoded, consumed)) => {
                self.buffer.advance(consumed);
                Ok(Some(decoded))
            }
            None => {
                trace!(client = %self.addr, buffered = self.buffer.len(), "Waiting for the rest of a command");
                Ok(None)
            }
        }
    }

    async fn fill_buffer(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(client = %self.addr, buffered = self.buffer.len(), "Input buffer over limit");
            return Err(ConnectionError::BufferFull);
        }
        self.buffer.reserve(READ_CHUNK);

        let read = self.stream.get_mut().read_buf(&mut self.buffer);
        let n = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| ConnectionError::IdleTimeout(limit))??,
            None => read.await?,
        };

        if n == 0 {
            return Err(if self.buffer.is_empty() {
                ConnectionError::ClientDisconnected
            } else {
                ConnectionError::UnexpectedEof
            });
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read from socket");
        Ok(())
    }

    async fn write_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        let encoded = reply.encode();
        self.stream.write_all(&encoded).await?;
        self.stream.flush().await?;

        self.stats.bytes_written(encoded.len());
        trace!(client = %self.addr, bytes = encoded.len(), "Wrote reply");
        Ok(())
    }
}

/// Why a connection ended.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The client sent bytes that are not a valid request
    #[error("malformed request: {0}")]
    ParseError(#[from] ParseError),

    #[error(transparent)]
    ExecutorClosed(#[from] ExecutorClosed),

    #[error("client closed the connection")]
    ClientDisconnected,

    /// EOF arrived in the middle of a command
    #[error("connection closed mid-command")]
    UnexpectedEof,

    #[error("input buffer exceeded {} bytes", MAX_BUFFER_SIZE)]
    BufferFull,

    #[error("no input for {0:?}")]
    IdleTimeout(Duration),
}

impl ConnectionError {
    /// The peer simply went away; not worth more than a debug line.
    pub fn is_hangup(&self) -> bool {
        match self {
            ConnectionError::ClientDisconnected => true,
            ConnectionError::IoError(e) => {
                matches!(e.kind(), ErrorKind::ConnectionReset | ErrorKind::BrokenPipe)
            }
            _ => false,
        }
    }
}

/// Runs one client connection to completion. Spawn this per accepted socket.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
    idle_timeout: Option<Duration>,
) {
    // `run` has already logged how the connection ended.
    let _ = ConnectionHandler::new(stream, addr, command_handler, stats, idle_timeout)
        .run()
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{load_registry, CommandRegistry};
    use crate::protocol::RespValue;
    use crate::storage::Store;
    use std::path::Path;
    use tokio::net::TcpListener;

    async fn create_test_server(
        idle_timeout: Option<Duration>,
    ) -> (SocketAddr, Arc<Store>, Arc<ConnectionStats>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registry: Arc<CommandRegistry> = Arc::new(
            load_registry(Path::new(env!("CARGO_MANIFEST_DIR")).join("commands")).unwrap(),
        );
        let store = Arc::new(Store::new());
        let stats = Arc::new(ConnectionStats::new());

        let store_clone = Arc::clone(&store);
        let stats_clone = Arc::clone(&stats);

        tokio::spawn(async move {
            while let Ok((stream, client_addr)) = listener.accept().await {
                let handler =
                    CommandHandler::new(Arc::clone(&registry), Arc::clone(&store_clone));
                let stats = Arc::clone(&stats_clone);
                tokio::spawn(handle_connection(
                    stream,
                    client_addr,
                    handler,
                    stats,
                    idle_timeout,
                ));
            }
        });

        (addr, store, stats)
    }

    /// Reads exactly `len` bytes, failing the test after two seconds.
    async fn read_reply(client: &mut TcpStream, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        tokio::time::timeout(Duration::from_secs(2), client.read_exact(&mut buf))
            .await
            .expect("timed out waiting for reply")
            .unwrap();
        buf
    }

    async fn expect_closed(client: &mut TcpStream) {
        let mut buf = [0u8; 64];
        let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
            .await
            .expect("connection was not closed")
            .unwrap_or(0);
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_set_get_ping_scenario() {
        let (addr, _, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client
            .write_all(b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n")
            .await
            .unwrap();
        assert_eq!(read_reply(&mut client, 5).await, b"+OK\r\n");

        client
            .write_all(b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n")
            .await
            .unwrap();
        assert_eq!(read_reply(&mut client, 9).await, b"$3\r\nbar\r\n");

        client.write_all(b"PING\r\n").await.unwrap();
        assert_eq!(read_reply(&mut client, 7).await, b"+PONG\r\n");
    }

    #[tokio::test]
    async fn test_unknown_inline_command_keeps_connection() {
        let (addr, _, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"FOO\r\n").await.unwrap();
        let expected = b"-ERR unknown command 'FOO'\r\n";
        assert_eq!(read_reply(&mut client, expected.len()).await, expected);

        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        assert_eq!(read_reply(&mut client, 7).await, b"+PONG\r\n");
    }

    #[tokio::test]
    async fn test_ping_with_empty_array_gets_a_reply() {
        let (addr, _, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"*2\r\n$4\r\nPING\r\n*0\r\n").await.unwrap();
        assert_eq!(read_reply(&mut client, 3).await, b"+\r\n");

        client.write_all(b"PING\r\n").await.unwrap();
        assert_eq!(read_reply(&mut client, 7).await, b"+PONG\r\n");
    }

    #[tokio::test]
    async fn test_pipelined_replies_stay_in_order() {
        let (addr, _, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        let mut request = Vec::new();
        let mut expected = Vec::new();
        for i in 0..50 {
            let key = format!("k{}", i);
            let value = format!("value-{}", i);
            RespValue::command(&["SET", key.as_str(), value.as_str()]).serialize_into(&mut request);
            RespValue::command(&["GET", key.as_str()]).serialize_into(&mut request);
            expected.extend_from_slice(b"+OK\r\n");
            expected.extend_from_slice(&Reply::Bulk(value.into()).encode());
        }
        request.extend_from_slice(b"\r\nECHO\r\n");
        let echo_error = b"-ERR wrong number of arguments for 'ECHO' command\r\n";
        expected.extend_from_slice(echo_error);

        client.write_all(&request).await.unwrap();
        assert_eq!(read_reply(&mut client, expected.len()).await, expected);
    }

    #[tokio::test]
    async fn test_expiry_over_the_wire() {
        let (addr, store, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client
            .write_all(&RespValue::command(&["SET", "temp", "v", "PX", "10"]).serialize())
            .await
            .unwrap();
        assert_eq!(read_reply(&mut client, 5).await, b"+OK\r\n");

        tokio::time::sleep(Duration::from_millis(20)).await;

        client
            .write_all(&RespValue::command(&["GET", "temp"]).serialize())
            .await
            .unwrap();
        assert_eq!(read_reply(&mut client, 5).await, b"$-1\r\n");
        assert!(!store.contains(b"temp"));
    }

    #[tokio::test]
    async fn test_decode_error_closes_connection() {
        let (addr, _, stats) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"*1\r\n$x\r\n").await.unwrap();
        expect_closed(&mut client).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);

        // Other clients are unaffected.
        let mut other = TcpStream::connect(addr).await.unwrap();
        other.write_all(b"PING\r\n").await.unwrap();
        assert_eq!(read_reply(&mut other, 7).await, b"+PONG\r\n");
    }

    #[tokio::test]
    async fn test_connections_share_store() {
        let (addr, _, _) = create_test_server(None).await;
        let mut writer = TcpStream::connect(addr).await.unwrap();
        let mut reader = TcpStream::connect(addr).await.unwrap();

        writer
            .write_all(&RespValue::command(&["SET", "shared", "yes"]).serialize())
            .await
            .unwrap();
        assert_eq!(read_reply(&mut writer, 5).await, b"+OK\r\n");

        reader
            .write_all(&RespValue::command(&["GET", "shared"]).serialize())
            .await
            .unwrap();
        assert_eq!(read_reply(&mut reader, 9).await, b"$3\r\nyes\r\n");
    }

    #[tokio::test]
    async fn test_idle_timeout_closes_connection() {
        let (addr, _, _) = create_test_server(Some(Duration::from_millis(50))).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"PING\r\n").await.unwrap();
        assert_eq!(read_reply(&mut client, 7).await, b"+PONG\r\n");

        expect_closed(&mut client).await;
    }

    #[tokio::test]
    async fn test_connection_stats() {
        let (addr, _, stats) = create_test_server(None).await;

        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);

        let mut client = TcpStream::connect(addr).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 1);

        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        let _ = read_reply(&mut client, 7).await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.bytes_read.load(Ordering::Relaxed), 14);
        assert_eq!(stats.bytes_written.load(Ordering::Relaxed), 7);

        drop(client);

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }
}
