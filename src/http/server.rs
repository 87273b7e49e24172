//! HTTP server setup and accept loop.
//!
//! # Responsibilities
//! - Build the shared, read-only server context from configuration
//! - Accept connections and spawn one task per connection
//! - Stop accepting on shutdown and drain in-flight connections
//! - Back off briefly after a failed accept

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::http::handler::serve_connection;
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::routing::Router;
use crate::websocket::{FrameEncoder, FrameEncoding, PayloadSource, Scoreboard};

/// Pause after a failed accept before accepting again.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Read-only state shared by every connection task.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub router: Router,
    pub encoder: FrameEncoder,
    pub payload: Arc<dyn PayloadSource>,
}

impl ServerContext {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            router: Router::default(),
            encoder: FrameEncoder::new(FrameEncoding::from_extended_length(
                config.websocket.extended_length,
            )),
            payload: Arc::new(Scoreboard::new(config.websocket.scores.clone())),
        }
    }
}

impl Default for ServerContext {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// The server: context plus the accept loop that hands connections to it.
pub struct HttpServer {
    context: Arc<ServerContext>,
    tracker: ConnectionTracker,
    drain_timeout: Duration,
}

impl HttpServer {
    /// Create a new server with the given configuration.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_context(
            ServerContext::from_config(config),
            Duration::from_secs(config.lifecycle.drain_timeout_secs),
        )
    }

    pub fn with_context(context: ServerContext, drain_timeout: Duration) -> Self {
        Self {
            context: Arc::new(context),
            tracker: ConnectionTracker::new(),
            drain_timeout,
        }
    }

    /// Live connection counter, shared with every spawned task.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.context.router.routes().len(),
            frame_encoding = ?self.context.encoder.encoding(),
            "HTTP server starting"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        let guard = self.tracker.track();
                        let context = Arc::clone(&self.context);
                        tokio::spawn(async move {
                            serve_connection(stream, peer_addr, &context, guard).await;
                        });
                    }
                    Err(e) => back_off_after_accept_error(&e).await,
                },
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
            }
        }

        drop(listener);

        let active = self.tracker.active_count();
        if active > 0 {
            tracing::info!(active_connections = active, "Draining connections");
        }
        if !self.tracker.drain(self.drain_timeout).await {
            tracing::warn!(
                active_connections = self.tracker.active_count(),
                "Drain timeout elapsed with connections still open"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn back_off_after_accept_error(error: &ListenerError) {
    tracing::warn!(
        error = %error,
        backoff_ms = ACCEPT_ERROR_BACKOFF.as_millis() as u64,
        "Server didn't accept the connection"
    );
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}
