//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! The listening port is not part of the schema; it is a required CLI
//! argument.

use serde::{Deserialize, Serialize};

use crate::http::request::MAX_REQUEST_LEN;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host, worker limit).
    pub listener: ListenerConfig,

    /// Response cache sizing.
    pub cache: CacheConfig,

    /// Byte-stream I/O tuning.
    pub io: IoConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind on; the port comes from the CLI.
    pub bind_host: String,

    /// Maximum concurrently processing workers (admission control).
    pub max_workers: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            max_workers: 400,
        }
    }
}

/// Response cache sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total cache capacity in bytes.
    pub capacity_bytes: usize,

    /// Largest footprint a single entry may have.
    pub max_entry_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: 200 << 20,
            max_entry_bytes: 10 << 20,
        }
    }
}

/// Byte-stream I/O tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IoConfig {
    /// Per-read chunk size for client and origin channels.
    pub chunk_bytes: usize,

    /// Largest request head accepted from a client.
    pub max_request_bytes: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: 4096,
            max_request_bytes: MAX_REQUEST_LEN,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics exporter.
    pub metrics_enabled: bool,

    /// Address the metrics exporter listens on.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}
