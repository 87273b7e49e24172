//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use socketme::config::ServerConfig;
use socketme::http::{HttpServer, ServerContext};
use socketme::lifecycle::Shutdown;
use socketme::net::Listener;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    /// Stop accepting and wait for the accept loop to finish draining.
    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

/// Start a server with default routes and payload.
pub async fn start_server() -> TestServer {
    start_server_with(ServerConfig::default()).await
}

/// Start a server built from `config`, ignoring its bind address.
#[allow(dead_code)]
pub async fn start_server_with(config: ServerConfig) -> TestServer {
    let listener = Listener::from_tokio(TcpListener::bind("127.0.0.1:0").await.unwrap());
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::with_context(
        ServerContext::from_config(&config),
        Duration::from_secs(config.lifecycle.drain_timeout_secs),
    );
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Write `raw` and read until the server closes the connection.
pub async fn roundtrip(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .expect("server did not close the connection")
        .unwrap();
    out
}
