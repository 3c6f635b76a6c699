//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges against protocol limits
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: `ProxyConfig → Result<(), Vec<...>>`

use crate::config::schema::ProxyConfig;
use crate::http::request::MAX_REQUEST_LEN;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.max_workers must be greater than zero")]
    ZeroWorkerLimit,

    #[error("io.chunk_bytes must be greater than zero")]
    ZeroChunkSize,

    #[error("cache.max_entry_bytes ({max_entry_bytes}) exceeds cache.capacity_bytes ({capacity_bytes})")]
    EntryLargerThanCache {
        max_entry_bytes: usize,
        capacity_bytes: usize,
    },

    #[error("io.max_request_bytes ({0}) must be in 1..={max}", max = MAX_REQUEST_LEN)]
    RequestLimitOutOfRange(usize),
}

/// Check a deserialized configuration for semantic problems.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.max_workers == 0 {
        errors.push(ValidationError::ZeroWorkerLimit);
    }
    if config.io.chunk_bytes == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    }
    if config.cache.max_entry_bytes > config.cache.capacity_bytes {
        errors.push(ValidationError::EntryLargerThanCache {
            max_entry_bytes: config.cache.max_entry_bytes,
            capacity_bytes: config.cache.capacity_bytes,
        });
    }
    if config.io.max_request_bytes == 0 || config.io.max_request_bytes > MAX_REQUEST_LEN {
        errors.push(ValidationError::RequestLimitOutOfRange(
            config.io.max_request_bytes,
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
