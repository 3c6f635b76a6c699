//! Caching Forward Proxy Library
//!
//! A single-host forwarding HTTP/1.x proxy built with Tokio: bounded worker
//! concurrency, a byte-exact request parser/serializer, and a shared LRU
//! response cache.

pub mod cache;
pub mod config;
pub mod http;
pub mod net;
pub mod observability;
pub mod proxy;

pub use cache::ResponseCache;
pub use config::ProxyConfig;
pub use http::Request;
pub use proxy::ProxyServer;
