//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc with every worker
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no reload support
//! - All fields have defaults so the proxy runs with just a port argument
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{CacheConfig, IoConfig, ListenerConfig, ObservabilityConfig, ProxyConfig};
