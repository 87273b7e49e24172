//! Response serialization.
//!
//! # Responsibilities
//! - Format plain responses (status line, Content-Type, Content-Length,
//!   `Connection: close`, body)
//! - Format the `101 Switching Protocols` upgrade response
//!
//! # Design Decisions
//! - Content-Length is always the body's byte length
//! - Every plain response closes the connection

/// Status codes this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
        }
    }

    /// Status text as it appears in the status line, e.g. `200 OK`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "200 OK",
            Status::BadRequest => "400 Bad Request",
            Status::NotFound => "404 Not Found",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete non-upgrade response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticResponse {
    pub status: Status,
    pub content_type: &'static str,
    pub body: &'static str,
}

impl StaticResponse {
    pub const fn html(status: Status, body: &'static str) -> Self {
        Self {
            status,
            content_type: "text/html",
            body,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.content_type,
            self.body.len(),
            self.body
        )
        .into_bytes()
    }
}

/// Build the `101 Switching Protocols` response for a derived accept key.
pub fn switching_protocols(accept_key: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        accept_key
    )
    .into_bytes()
}
