//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed Request (request line, headers)
//!     → router.rs (route table lookup)
//!     → matcher.rs (exact request line, then header conditions)
//!     → Return: RouteDecision (Static / Upgrade / NotFound)
//! ```
//!
//! # Design Decisions
//! - Route table is a static, immutable at runtime
//! - Exact string matching on the whole request line
//! - Deterministic: same input always yields the same decision
//! - Explicit NotFound rather than silent default

pub mod matcher;
pub mod router;

pub use router::{Route, RouteDecision, RouteTarget, Router, ROUTES};
