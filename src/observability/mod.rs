//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with connection_id / peer_addr / request_line fields
//!     → logging.rs (subscriber: env filter + fmt or JSON layer)
//!     → stdout
//! ```

pub mod logging;

pub use logging::init_logging;
