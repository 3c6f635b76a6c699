//! Connection dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! net::BoundedListener (permit + TCP stream)
//!     → server.rs (spawn one worker task per connection)
//!     → worker.rs (per-connection state machine)
//!
//! worker states:
//!     Accepted → Reading → {CacheHit | Parsing}
//!                              → {Forwarding → Caching} → Closed
//! ```
//!
//! # Design Decisions
//! - Workers share nothing but the response cache; request and response
//!   buffers are exclusively owned by the worker
//! - Protocol errors are translated into client-visible error pages and
//!   never propagate past the connection that caused them

pub mod server;
pub mod worker;

pub use server::ProxyServer;
