//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for fetching, persistence, configuration and startup
//! - Processing statistics tracking (errors and warnings per category)
//! - The shop-level retry strategy
//!
//! Error categories are split into:
//! - **Errors**: Failures that drop a page, a listing or an enrichment step
//! - **Warnings**: Missing optional data that doesn't prevent processing

mod stats;
mod types;

use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    ConfigurationError, ErrorType, FetchError, InitializationError, PersistenceError,
    WarningType,
};

/// Creates the exponential backoff used between attempts of a failing shop.
///
/// Yields at most `retries` delays, starting at `RETRY_INITIAL_DELAY_MS` and
/// multiplied by `RETRY_FACTOR` up to `RETRY_MAX_DELAY_SECS`.
pub fn get_retry_strategy(retries: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(crate::config::RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::RETRY_FACTOR)
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
        .take(retries)
}
