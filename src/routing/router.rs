//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Hold the fixed route table
//! - Decide, per request, between a static page, an upgrade, or not found
//!
//! # Design Decisions
//! - The table is a `static` slice: read-only, shared without locks
//! - First matching request line wins
//! - The upgrade route falls back to 400 when its header conditions fail

use crate::http::{Request, StaticResponse, Status};
use crate::routing::matcher::{HeaderMatcher, Matcher, RequestLineMatcher};
use crate::websocket::derive_accept_key;

/// Header carrying the client handshake key.
pub const SEC_WEBSOCKET_KEY: &str = "Sec-WebSocket-Key";

/// Headers the upgrade route requires, compared exactly.
pub const UPGRADE_HEADERS: &[HeaderMatcher] = &[
    HeaderMatcher::new("Upgrade", "websocket"),
    HeaderMatcher::new("Connection", "Upgrade"),
];

pub const BAD_REQUEST: StaticResponse =
    StaticResponse::html(Status::BadRequest, "<h1>400 Bad Request</h1>");

pub const NOT_FOUND: StaticResponse =
    StaticResponse::html(Status::NotFound, "<h1>404 Not Found</h1>");

/// The built-in route table.
pub static ROUTES: &[Route] = &[
    Route {
        name: "index",
        matcher: RequestLineMatcher::new("GET / HTTP/1.1"),
        target: RouteTarget::Page(StaticResponse::html(
            Status::Ok,
            "<h1>This is the index</h1>",
        )),
    },
    Route {
        name: "random",
        matcher: RequestLineMatcher::new("GET /random HTTP/1.1"),
        target: RouteTarget::Page(StaticResponse::html(
            Status::Ok,
            "<h1>This is the random page!</h1>",
        )),
    },
    Route {
        name: "socketme",
        matcher: RequestLineMatcher::new("GET /socketme HTTP/1.1"),
        target: RouteTarget::Upgrade {
            required: UPGRADE_HEADERS,
        },
    },
];

/// What a matched route does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// Serve a fixed response.
    Page(StaticResponse),
    /// Perform the WebSocket handshake if every header matcher passes.
    Upgrade { required: &'static [HeaderMatcher] },
}

/// An entry in the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Route identifier for logging.
    pub name: &'static str,
    pub matcher: RequestLineMatcher,
    pub target: RouteTarget,
}

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Write this response and close. Includes routing-level client errors.
    Static(StaticResponse),
    /// Write `101 Switching Protocols` with this accept key, then push a frame.
    Upgrade { accept_key: String },
    /// No route matched the request line.
    NotFound,
}

/// Dispatches requests against an immutable route table.
#[derive(Debug, Clone, Copy)]
pub struct Router {
    routes: &'static [Route],
}

impl Router {
    pub const fn new(routes: &'static [Route]) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &'static [Route] {
        self.routes
    }

    /// Find the route whose request line matches exactly.
    pub fn match_request(&self, req: &Request) -> Option<&'static Route> {
        self.routes.iter().find(|route| route.matcher.matches(req))
    }

    /// Decide how to answer `req`.
    pub fn dispatch(&self, req: &Request) -> RouteDecision {
        let Some(route) = self.match_request(req) else {
            return RouteDecision::NotFound;
        };

        match &route.target {
            RouteTarget::Page(response) => RouteDecision::Static(response.clone()),
            RouteTarget::Upgrade { required } => {
                if required.matches(req) {
                    let key = req.header(SEC_WEBSOCKET_KEY).unwrap_or_default();
                    RouteDecision::Upgrade {
                        accept_key: derive_accept_key(key),
                    }
                } else {
                    RouteDecision::Static(BAD_REQUEST)
                }
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(ROUTES)
    }
}
