//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! raw bytes from client
//!     → request.rs (parse request line + headers)
//!     → headers.rs (ordered header store, rewrite for forwarding)
//!     → request.rs (serialize absolute-form request for the origin)
//!
//! on rejection:
//!     → error_page.rs (canned HTML error response to the client)
//! ```

pub mod error_page;
pub mod headers;
pub mod request;

pub use headers::{HeaderEntry, HeaderStore};
pub use request::Request;

/// Protocol-level error taxonomy.
///
/// Parsing and serialization failures are recovered at the worker boundary
/// and translated into a client-visible error response; they never outlive
/// a single connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    /// Bad request line, missing host/path, bad port, or header without colon.
    #[error("malformed request")]
    MalformedRequest,
    /// Request method other than GET.
    #[error("unsupported method, only GET is accepted")]
    UnsupportedMethod,
    /// Version token is not HTTP/1.0 or HTTP/1.1.
    #[error("unsupported HTTP version")]
    UnsupportedVersion,
    /// Serialization target is smaller than the computed output length.
    #[error("serialization buffer too small")]
    BufferTooSmall,
    /// Allocation failure while growing a header or body buffer.
    #[error("out of memory")]
    OutOfMemory,
    /// Status code outside the canned error-page set.
    #[error("unsupported status code {0}")]
    UnsupportedStatus(u16),
}
