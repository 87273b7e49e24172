//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (bind address parses, drain timeout > 0)
//! - Check the configured scoreboard fits a short frame unless extended
//!   lengths are enabled
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;
use crate::websocket::frame::MAX_SHORT_PAYLOAD;
use crate::websocket::{PayloadSource, Scoreboard};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `listener.bind_address` is not a socket address.
    InvalidBindAddress(String),
    /// `observability.log_level` is not a known level.
    UnknownLogLevel(String),
    /// `lifecycle.drain_timeout_secs` is zero.
    ZeroDrainTimeout,
    /// `websocket.scores` serializes past the short frame limit while
    /// `websocket.extended_length` is off.
    PayloadTooLarge { len: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "listener.bind_address '{}' is not a socket address", addr)
            }
            ValidationError::UnknownLogLevel(level) => {
                write!(f, "observability.log_level '{}' is not one of {:?}", level, LOG_LEVELS)
            }
            ValidationError::ZeroDrainTimeout => {
                write!(f, "lifecycle.drain_timeout_secs must be greater than zero")
            }
            ValidationError::PayloadTooLarge { len } => write!(
                f,
                "websocket.scores serializes to {} bytes, more than {} allowed without websocket.extended_length",
                len, MAX_SHORT_PAYLOAD
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.lifecycle.drain_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDrainTimeout);
    }

    if !config.websocket.extended_length {
        let board = Scoreboard::new(config.websocket.scores.clone());
        if let Ok(json) = board.payload() {
            if json.len() > MAX_SHORT_PAYLOAD {
                errors.push(ValidationError::PayloadTooLarge { len: json.len() });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
