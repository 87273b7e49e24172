//! WebSocket upgrade support.
//!
//! # Data Flow
//! ```text
//! Upgrade request (Sec-WebSocket-Key)
//!     → handshake.rs (derive Sec-WebSocket-Accept)
//!     → 101 Switching Protocols written by the connection handler
//!     → payload.rs (application bytes, JSON)
//!     → frame.rs (single unmasked text frame)
//!     → written once, then the connection closes
//! ```
//!
//! # Design Decisions
//! - Server push only: nothing is read from the client after the handshake
//! - No fragmentation, masking or control frames
//! - Short (7-bit) length encoding by default; extended lengths are opt-in

pub mod frame;
pub mod handshake;
pub mod payload;

pub use frame::{FrameEncoder, FrameEncoding, FrameError};
pub use handshake::{derive_accept_key, WS_GUID};
pub use payload::{PayloadError, PayloadSource, Scoreboard};
