//! Accept-key derivation for the opening handshake.
//!
//! Computes `Base64(SHA-1(key + GUID))` for the `Sec-WebSocket-Accept` header.

use base64::Engine;
use sha1::{Digest, Sha1};

/// Magic GUID appended to the client key before hashing.
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Derive the `Sec-WebSocket-Accept` value for a client `Sec-WebSocket-Key`.
///
/// Pure and total: any input string, including the empty string, yields a
/// 28-character padded Base64 string.
pub fn derive_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    let digest = hasher.finalize();
    base64::engine::general_purpose::STANDARD.encode(digest)
}
