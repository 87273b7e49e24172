//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener from validated configuration
//! - Build the server context
//! - Run the accept loop until shutdown
//!
//! # Design Decisions
//! - Fail fast: a bind error is fatal
//! - The listener is bound last, once everything else is ready

use thiserror::Error;

use crate::config::ServerConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};

/// Fatal errors while starting or running the server.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bind, serve, and return once `shutdown` has fired and connections drained.
pub async fn run(config: ServerConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let server = HttpServer::new(&config);
    let listener = Listener::bind(&config.listener).await?;

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
