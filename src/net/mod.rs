//! Network layer.
//!
//! # Data Flow
//! ```text
//! OS accept queue
//!     → listener.rs (acquire worker permit, accept TCP connection)
//!     → proxy::worker (one task per connection, permit held for its lifetime)
//! ```

pub mod listener;

pub use listener::{BoundedListener, ListenerError, WorkerPermit};
