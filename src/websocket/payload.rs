//! Application data pushed to the client after the handshake.

use serde::Serialize;
use thiserror::Error;

use crate::config::ScoreEntry;

/// Failure to produce a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Supplies the bytes carried by the single frame sent on each upgrade.
pub trait PayloadSource: Send + Sync + std::fmt::Debug {
    fn payload(&self) -> Result<Vec<u8>, PayloadError>;
}

/// A fixed list of `{name, score}` records, sent as a JSON array.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Scoreboard {
    entries: Vec<ScoreEntry>,
}

impl Scoreboard {
    pub fn new(entries: Vec<ScoreEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }
}

impl PayloadSource for Scoreboard {
    fn payload(&self) -> Result<Vec<u8>, PayloadError> {
        Ok(serde_json::to_vec(self)?)
    }
}
