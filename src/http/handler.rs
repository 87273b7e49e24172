//! Per-connection request handling.
//!
//! # Responsibilities
//! - Read one request head from the connection
//! - Dispatch it through the router
//! - Write the plain response, or the upgrade response followed by one frame
//! - Close the connection on every path
//!
//! # Design Decisions
//! - One request per connection; nothing is read after the head
//! - A read failure sends nothing back
//! - No retries: the first failure ends the connection

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::http::request::{read_request, ReadError};
use crate::http::response::{switching_protocols, StaticResponse};
use crate::http::server::ServerContext;
use crate::net::{ConnectionGuard, ConnectionState};
use crate::routing::router::NOT_FOUND;
use crate::routing::RouteDecision;
use crate::websocket::{FrameError, PayloadError};

const FRAME_WRITE: &str = "websocket frame";

/// Why a connection ended early.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("error writing {what}: {source}")]
    Write {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("error encoding frame: {0}")]
    Frame(#[from] FrameError),

    #[error("error building payload: {0}")]
    Payload(#[from] PayloadError),
}

impl ConnectionError {
    /// True when the handshake went out but the frame did not.
    pub fn is_frame_failure(&self) -> bool {
        match self {
            ConnectionError::Frame(_) | ConnectionError::Payload(_) => true,
            ConnectionError::Write { what, .. } => *what == FRAME_WRITE,
            ConnectionError::Read(_) => false,
        }
    }
}

/// What was written back on a successfully handled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A plain response with this status code.
    Responded(u16),
    /// The 101 response and a frame with this many payload bytes.
    Upgraded { payload_len: usize },
}

/// Handle one connection from first byte to close.
///
/// The stream is owned for the whole call and dropped (closed) when it
/// returns, whatever the result.
pub async fn handle_connection<S>(
    stream: S,
    ctx: &ServerContext,
    guard: &mut ConnectionGuard,
) -> Result<Outcome, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(stream);

    guard.transition(ConnectionState::Reading);
    let request = read_request(&mut reader).await?;

    guard.transition(ConnectionState::Dispatching);
    tracing::info!(
        connection_id = %guard.id(),
        request_line = %request.request_line(),
        "Request"
    );
    let decision = ctx.router.dispatch(&request);

    guard.transition(ConnectionState::Responding);
    let stream = reader.get_mut();
    let outcome = match decision {
        RouteDecision::Upgrade { accept_key } => {
            write(stream, &switching_protocols(&accept_key), "upgrade response").await?;

            let payload = ctx.payload.payload()?;
            let frame = ctx.encoder.encode(&payload)?;
            write(stream, &frame, FRAME_WRITE).await?;

            Outcome::Upgraded {
                payload_len: payload.len(),
            }
        }
        RouteDecision::Static(response) => write_static(stream, &response).await?,
        RouteDecision::NotFound => write_static(stream, &NOT_FOUND).await?,
    };

    if let Err(e) = stream.shutdown().await {
        tracing::debug!(connection_id = %guard.id(), error = %e, "Shutdown after response failed");
    }

    Ok(outcome)
}

/// Run [`handle_connection`] and log how it ended.
pub async fn serve_connection<S>(
    stream: S,
    peer_addr: SocketAddr,
    ctx: &ServerContext,
    mut guard: ConnectionGuard,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let connection_id = guard.id();

    match handle_connection(stream, ctx, &mut guard).await {
        Ok(outcome) => {
            tracing::debug!(
                connection_id = %connection_id,
                peer_addr = %peer_addr,
                outcome = ?outcome,
                "Response written"
            );
        }
        Err(e) if e.is_frame_failure() => {
            tracing::error!(
                connection_id = %connection_id,
                peer_addr = %peer_addr,
                error = %e,
                "Could not send websocket frame"
            );
        }
        Err(e) => {
            tracing::warn!(
                connection_id = %connection_id,
                peer_addr = %peer_addr,
                error = %e,
                "Connection failed"
            );
        }
    }
}

async fn write_static<W>(stream: &mut W, response: &StaticResponse) -> Result<Outcome, ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    write(stream, &response.to_bytes(), "response").await?;
    Ok(Outcome::Responded(response.status.code()))
}

async fn write<W>(stream: &mut W, bytes: &[u8], what: &'static str) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    stream
        .write_all(bytes)
        .await
        .map_err(|source| ConnectionError::Write { what, source })?;
    stream
        .flush()
        .await
        .map_err(|source| ConnectionError::Write { what, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::ReadStage;
    use crate::net::ConnectionTracker;
    use crate::websocket::{derive_accept_key, FrameEncoder, FrameEncoding, PayloadSource};
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use tokio::io::{duplex, AsyncReadExt, ReadBuf};

    #[derive(Debug)]
    struct FixedPayload(Vec<u8>);

    impl PayloadSource for FixedPayload {
        fn payload(&self) -> Result<Vec<u8>, PayloadError> {
            Ok(self.0.clone())
        }
    }

    /// Serves `input` and accepts at most `limit` written bytes.
    struct CappedStream {
        input: &'static [u8],
        written: usize,
        limit: usize,
    }

    impl AsyncRead for CappedStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.input).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for CappedStream {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.written + buf.len() > self.limit {
                return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
            }
            self.written += buf.len();
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    async fn exchange(ctx: &ServerContext, raw: &[u8]) -> (Result<Outcome, ConnectionError>, Vec<u8>) {
        let (mut client, server) = duplex(64 * 1024);
        client.write_all(raw).await.unwrap();
        client.shutdown().await.unwrap();

        let tracker = ConnectionTracker::new();
        let mut guard = tracker.track();
        let result = handle_connection(server, ctx, &mut guard).await;

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        (result, out)
    }

    #[tokio::test]
    async fn guard_reaches_responding() {
        let (mut client, server) = duplex(1024);
        client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

        let tracker = ConnectionTracker::new();
        let mut guard = tracker.track();
        handle_connection(server, &ServerContext::default(), &mut guard)
            .await
            .unwrap();
        assert_eq!(guard.state(), ConnectionState::Responding);
    }

    #[tokio::test]
    async fn index_gets_200() {
        let (result, out) = exchange(&ServerContext::default(), b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert_eq!(result.unwrap(), Outcome::Responded(200));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 26\r\nConnection: close\r\n\r\n<h1>This is the index</h1>"
        );
    }

    #[tokio::test]
    async fn unknown_path_gets_404() {
        let (result, out) = exchange(&ServerContext::default(), b"GET /nope HTTP/1.1\r\n\r\n").await;
        assert_eq!(result.unwrap(), Outcome::Responded(404));
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.ends_with("<h1>404 Not Found</h1>"));
    }

    #[tokio::test]
    async fn upgrade_without_headers_gets_400() {
        let (result, out) = exchange(&ServerContext::default(), b"GET /socketme HTTP/1.1\r\n\r\n").await;
        assert_eq!(result.unwrap(), Outcome::Responded(400));
        assert!(String::from_utf8(out).unwrap().starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn upgrade_writes_101_then_one_frame() {
        let raw = b"GET /socketme HTTP/1.1\r\n\
                    Host: localhost:8000\r\n\
                    Upgrade: websocket\r\n\
                    Connection: Upgrade\r\n\
                    Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
                    Sec-WebSocket-Version: 13\r\n\r\n";
        let (result, out) = exchange(&ServerContext::default(), raw).await;

        let json = br#"[{"name":"Alice","score":100},{"name":"Bob","score":200}]"#;
        assert_eq!(result.unwrap(), Outcome::Upgraded { payload_len: json.len() });

        let head = b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n";
        assert_eq!(&out[..head.len()], head);

        let frame = &out[head.len()..];
        assert_eq!(frame[0], 0x81);
        assert_eq!(frame[1] as usize, json.len());
        assert_eq!(&frame[2..], json);
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected_after_handshake() {
        let ctx = ServerContext {
            payload: Arc::new(FixedPayload(vec![b'a'; 126])),
            ..ServerContext::default()
        };
        let raw = b"GET /socketme HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n";
        let (result, out) = exchange(&ctx, raw).await;

        assert!(matches!(
            result,
            Err(ConnectionError::Frame(FrameError::PayloadTooLarge { len: 126, max: 125 }))
        ));
        assert!(out.starts_with(b"HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(out.ends_with(b"\r\n\r\n"));
    }

    #[tokio::test]
    async fn extended_encoding_sends_large_payload() {
        let ctx = ServerContext {
            payload: Arc::new(FixedPayload(vec![b'a'; 300])),
            encoder: FrameEncoder::new(FrameEncoding::Extended),
            ..ServerContext::default()
        };
        let raw = b"GET /socketme HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n";
        let (result, out) = exchange(&ctx, raw).await;

        assert_eq!(result.unwrap(), Outcome::Upgraded { payload_len: 300 });
        let frame = &out[out.len() - 304..];
        assert_eq!(&frame[..4], &[0x81, 126, 0x01, 0x2c]);
    }

    #[tokio::test]
    async fn truncated_head_sends_nothing() {
        let (result, out) = exchange(&ServerContext::default(), b"GET / HTTP/1.1\r\nHost: x\r\n").await;
        match result {
            Err(ConnectionError::Read(e)) => assert_eq!(e.stage, ReadStage::Headers),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn closed_client_is_a_read_error() {
        let (client, server) = duplex(1024);
        drop(client);

        let tracker = ConnectionTracker::new();
        let mut guard = tracker.track();
        let err = handle_connection(server, &ServerContext::default(), &mut guard)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Read(ref e) if e.stage == ReadStage::RequestLine));
        assert_eq!(err.to_string(), "error reading request line: stream ended before end of line");
    }

    #[tokio::test]
    async fn vanished_client_is_a_write_error() {
        let (mut client, server) = duplex(1024);
        client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
        drop(client);

        let tracker = ConnectionTracker::new();
        let mut guard = tracker.track();
        let err = handle_connection(server, &ServerContext::default(), &mut guard)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Write { what: "response", .. }));
    }

    #[tokio::test]
    async fn serve_connection_releases_guard() {
        let (mut client, server) = duplex(1024);
        client.write_all(b"GET /random HTTP/1.1\r\n\r\n").await.unwrap();

        let tracker = ConnectionTracker::new();
        let guard = tracker.track();
        let ctx = ServerContext::default();
        serve_connection(server, "127.0.0.1:1".parse().unwrap(), &ctx, guard).await;
        assert_eq!(tracker.active_count(), 0);

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert!(out.ends_with("<h1>This is the random page!</h1>"));
    }

    #[tokio::test]
    async fn failed_frame_write_is_a_frame_failure() {
        let stream = CappedStream {
            input: b"GET /socketme HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n",
            written: 0,
            limit: switching_protocols(&derive_accept_key("")).len(),
        };

        let tracker = ConnectionTracker::new();
        let mut guard = tracker.track();
        let err = handle_connection(stream, &ServerContext::default(), &mut guard)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Write { what: "websocket frame", .. }));
        assert!(err.is_frame_failure());
    }

    #[test]
    fn frame_failures_are_told_apart_from_connection_failures() {
        let write = |what: &'static str| ConnectionError::Write {
            what,
            source: io::ErrorKind::BrokenPipe.into(),
        };
        assert!(write(FRAME_WRITE).is_frame_failure());
        assert!(!write("response").is_frame_failure());
        assert!(!write("upgrade response").is_frame_failure());

        let too_large = FrameError::PayloadTooLarge { len: 126, max: 125 };
        assert!(ConnectionError::Frame(too_large).is_frame_failure());
    }
}
