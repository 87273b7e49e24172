//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop source)
//!     → connection.rs (ID, state tracking, drain on shutdown)
//!     → Hand off to HTTP layer
//!
//! Connection States:
//!     Idle → Reading → Dispatching → Responding → Closed
//! ```
//!
//! # Design Decisions
//! - One task per connection; tasks share nothing mutable
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionState, ConnectionTracker};
pub use listener::{Listener, ListenerError};
