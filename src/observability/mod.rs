//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! workers and cache produce:
//!     → tracing events (structured logs, initialized in main)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout log output
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap atomic operations; recording never blocks a
//!   worker
//! - The exporter is optional; with it disabled the macros are no-ops

pub mod metrics;
