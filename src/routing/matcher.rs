//! Route matching logic.
//!
//! # Responsibilities
//! - Match the full request line (exact, case-sensitive)
//! - Match header values (exact name, exact value)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - No method/path/version parsing: a malformed request line simply never
//!   matches
//! - Header names are compared as received (case-sensitive)
//! - Matchers are `const`-constructible so route tables can be statics

use crate::http::Request;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request) -> bool;
}

/// Matches the whole request line, e.g. `GET / HTTP/1.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLineMatcher {
    line: &'static str,
}

impl RequestLineMatcher {
    pub const fn new(line: &'static str) -> Self {
        Self { line }
    }

    pub fn line(&self) -> &'static str {
        self.line
    }
}

impl Matcher for RequestLineMatcher {
    fn matches(&self, req: &Request) -> bool {
        req.request_line() == self.line
    }
}

/// Matches when a header is present with exactly the expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatcher {
    name: &'static str,
    value: &'static str,
}

impl HeaderMatcher {
    pub const fn new(name: &'static str, value: &'static str) -> Self {
        Self { name, value }
    }
}

impl Matcher for HeaderMatcher {
    fn matches(&self, req: &Request) -> bool {
        req.header(self.name) == Some(self.value)
    }
}

// A slice of matchers is their conjunction; an empty slice always matches.
impl<M: Matcher> Matcher for [M] {
    fn matches(&self, req: &Request) -> bool {
        self.iter().all(|m| m.matches(req))
    }
}
