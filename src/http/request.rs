//! Request-line and header parsing.
//!
//! # Responsibilities
//! - Read the request line and header block from a buffered stream
//! - Split header lines on the first colon into trimmed name/value pairs
//! - Report which stage a read failure happened in
//!
//! # Design Decisions
//! - Header names are stored as received (case-sensitive), last write wins
//! - Lines without a colon are skipped, not rejected
//! - Bytes that are not UTF-8 are decoded lossily, never rejected
//! - Each line is capped at `MAX_LINE_BYTES`
//! - The request body is never read

use std::collections::HashMap;
use std::fmt;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Longest request or header line accepted, newline included.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Which part of the request was being read when the stream failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStage {
    RequestLine,
    Headers,
}

impl fmt::Display for ReadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadStage::RequestLine => f.write_str("request line"),
            ReadStage::Headers => f.write_str("headers"),
        }
    }
}

/// A read failure while parsing the request head.
#[derive(Debug, thiserror::Error)]
#[error("error reading {stage}: {source}")]
pub struct ReadError {
    pub stage: ReadStage,
    #[source]
    pub source: io::Error,
}

impl ReadError {
    fn new(stage: ReadStage, source: io::Error) -> Self {
        Self { stage, source }
    }
}

/// A parsed request head. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    request_line: String,
    headers: HashMap<String, String>,
}

impl Request {
    pub fn new(request_line: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            request_line: request_line.into(),
            headers,
        }
    }

    /// The trimmed request line, e.g. `GET / HTTP/1.1`.
    pub fn request_line(&self) -> &str {
        &self.request_line
    }

    /// Exact (case-sensitive) header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

/// Read one request head from `reader`.
///
/// The first newline-terminated line is the request line. Following lines are
/// headers until a line that is blank after trimming. A stream that ends before
/// a line's newline is reached fails with the stage it was in.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, ReadError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();

    read_line(reader, &mut line)
        .await
        .map_err(|e| ReadError::new(ReadStage::RequestLine, e))?;
    let request_line = String::from_utf8_lossy(&line).trim().to_string();

    let mut headers = HashMap::new();
    loop {
        line.clear();
        read_line(reader, &mut line)
            .await
            .map_err(|e| ReadError::new(ReadStage::Headers, e))?;

        let decoded = String::from_utf8_lossy(&line);
        let trimmed = decoded.trim();
        if trimmed.is_empty() {
            break;
        }

        if let Some((name, value)) = trimmed.split_once(':') {
            headers.insert(name.trim().to_string(), value.trim().to_string());
        }
    }

    Ok(Request::new(request_line, headers))
}

async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut limited = reader.take(MAX_LINE_BYTES as u64);
    limited.read_until(b'\n', buf).await?;

    if buf.ends_with(b"\n") {
        Ok(())
    } else if buf.len() >= MAX_LINE_BYTES {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line longer than {} bytes", MAX_LINE_BYTES),
        ))
    } else {
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream ended before end of line",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse(raw: &[u8]) -> Result<Request, ReadError> {
        let mut reader = raw;
        read_request(&mut reader).await
    }

    #[tokio::test]
    async fn parses_request_line_and_headers() {
        let req = parse(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();
        assert_eq!(req.request_line(), "GET / HTTP/1.1");
        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.header("Host"), Some("x"));
    }

    #[tokio::test]
    async fn skips_lines_without_colon() {
        let req = parse(b"GET / HTTP/1.1\r\ngarbage\r\nHost: x\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.headers().len(), 1);
        assert!(req.header("garbage").is_none());
    }

    #[tokio::test]
    async fn splits_on_first_colon_and_trims() {
        let req = parse(b"GET / HTTP/1.1\r\n  Host :  localhost:8000  \r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.header("Host"), Some("localhost:8000"));
    }

    #[tokio::test]
    async fn header_names_are_case_sensitive_and_last_wins() {
        let req = parse(b"GET / HTTP/1.1\r\nupgrade: a\r\nUpgrade: b\r\nUpgrade: c\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.header("Upgrade"), Some("c"));
        assert_eq!(req.header("upgrade"), Some("a"));
        assert_eq!(req.headers().len(), 2);
    }

    #[tokio::test]
    async fn accepts_bare_newlines() {
        let req = parse(b"GET /random HTTP/1.1\nHost: x\n\n").await.unwrap();
        assert_eq!(req.request_line(), "GET /random HTTP/1.1");
        assert_eq!(req.header("Host"), Some("x"));
    }

    #[tokio::test]
    async fn body_is_left_unread() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\nbody";
        let mut reader = &raw[..];
        let req = read_request(&mut reader).await.unwrap();
        assert_eq!(req.header("Content-Length"), Some("4"));
        assert_eq!(reader, b"body");
    }

    #[tokio::test]
    async fn empty_stream_fails_on_request_line() {
        let err = parse(b"").await.unwrap_err();
        assert_eq!(err.stage, ReadStage::RequestLine);
        assert_eq!(err.source.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn unterminated_request_line_fails() {
        let err = parse(b"GET / HTTP/1.1").await.unwrap_err();
        assert_eq!(err.stage, ReadStage::RequestLine);
    }

    #[tokio::test]
    async fn missing_blank_line_fails_on_headers() {
        let err = parse(b"GET / HTTP/1.1\r\nHost: x\r\n").await.unwrap_err();
        assert_eq!(err.stage, ReadStage::Headers);
        assert_eq!(err.to_string(), "error reading headers: stream ended before end of line");
    }

    #[tokio::test]
    async fn non_utf8_header_values_are_decoded_lossily() {
        let req = parse(b"GET / HTTP/1.1\r\nUser-Agent: caf\xe9\r\nHost: x\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.request_line(), "GET / HTTP/1.1");
        assert_eq!(req.header("User-Agent"), Some("caf\u{FFFD}"));
        assert_eq!(req.header("Host"), Some("x"));
    }

    #[tokio::test]
    async fn overlong_header_line_fails_on_headers() {
        let mut raw = b"GET / HTTP/1.1\r\nX-Long: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(MAX_LINE_BYTES));
        raw.extend_from_slice(b"\r\n\r\n");

        let err = parse(&raw).await.unwrap_err();
        assert_eq!(err.stage, ReadStage::Headers);
        assert_eq!(err.source.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn overlong_request_line_fails_on_request_line() {
        let raw = vec![b'G'; MAX_LINE_BYTES + 1];
        let err = parse(&raw).await.unwrap_err();
        assert_eq!(err.stage, ReadStage::RequestLine);
        assert_eq!(err.source.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn line_at_the_limit_is_accepted() {
        let mut raw = b"GET / HTTP/1.1\r\nX: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(MAX_LINE_BYTES - 5));
        raw.extend_from_slice(b"\r\n\r\n");

        let req = parse(&raw).await.unwrap();
        assert_eq!(req.header("X").map(str::len), Some(MAX_LINE_BYTES - 5));
    }
}
