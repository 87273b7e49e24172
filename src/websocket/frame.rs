//! Server-to-client frame encoding.
//!
//! Every frame produced here is a single unmasked text frame with FIN set:
//!
//! ```text
//! byte 0      byte 1          [extended length]   payload
//! 0x81        0..=125 | 126 | 127
//! ```
//!
//! `Short` encoding only ever emits the first form. `Extended` adds the
//! 16-bit (126) and 64-bit (127) big-endian length forms for larger payloads.

use thiserror::Error;

/// FIN bit set, opcode 0x1 (text).
pub const FIN_TEXT: u8 = 0x81;

/// Largest payload that fits in the 7-bit length field.
pub const MAX_SHORT_PAYLOAD: usize = 125;

const LEN_16: u8 = 126;
const LEN_64: u8 = 127;

/// Frame encoding failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("payload of {len} bytes exceeds the {max} byte frame limit")]
    PayloadTooLarge { len: usize, max: usize },
}

/// How payload lengths are written into the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameEncoding {
    /// 7-bit length only; payloads over 125 bytes are rejected.
    #[default]
    Short,
    /// 7-bit length plus the 16/64-bit extended forms.
    Extended,
}

impl FrameEncoding {
    pub fn from_extended_length(enabled: bool) -> Self {
        if enabled {
            FrameEncoding::Extended
        } else {
            FrameEncoding::Short
        }
    }
}

/// Encodes payloads into text frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameEncoder {
    encoding: FrameEncoding,
}

impl FrameEncoder {
    pub fn new(encoding: FrameEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> FrameEncoding {
        self.encoding
    }

    /// Encode `payload` as a single text frame.
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
        match self.encoding {
            FrameEncoding::Short => encode_text_frame(payload),
            FrameEncoding::Extended => Ok(encode_text_frame_extended(payload)),
        }
    }
}

/// Encode a payload of at most 125 bytes as `0x81, len, payload...`.
pub fn encode_text_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_SHORT_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_SHORT_PAYLOAD,
        });
    }

    let mut frame = Vec::with_capacity(payload.len() + 2);
    frame.push(FIN_TEXT);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Encode a payload of any size, using extended length fields when needed.
pub fn encode_text_frame_extended(payload: &[u8]) -> Vec<u8> {
    let len = payload.len();
    let mut frame = Vec::with_capacity(len + 10);
    frame.push(FIN_TEXT);

    if len <= MAX_SHORT_PAYLOAD {
        frame.push(len as u8);
    } else if len <= u16::MAX as usize {
        frame.push(LEN_16);
        frame.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        frame.push(LEN_64);
        frame.extend_from_slice(&(len as u64).to_be_bytes());
    }

    frame.extend_from_slice(payload);
    frame
}
