//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, one task per connection)
//!     → handler.rs (per-connection orchestration)
//!     → request.rs (request line + headers)
//!     → [routing layer decides: page / upgrade / not found]
//!     → response.rs (plain response or 101 Switching Protocols)
//!     → Send to client, close
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use handler::{handle_connection, ConnectionError, Outcome};
pub use request::{read_request, ReadError, ReadStage, Request};
pub use response::{StaticResponse, Status};
pub use server::{HttpServer, ServerContext};
