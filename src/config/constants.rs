//! Configuration constants.
//!
//! This module defines the constants used throughout the application,
//! including timeouts, pagination limits, and retry parameters.

pub const DB_PATH: &str = "./catalog_scraper.db";

/// Safety ceiling on pages visited per base URL.
/// Catalogs that never return an empty page stop here.
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Default delay between consecutive page fetches in milliseconds (0 = none)
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 0;

/// Default User-Agent string for HTTP requests.
///
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Placeholder substituted with the page number in pagination templates
pub const PAGE_PLACEHOLDER: &str = "{page}";

// Error message limits
/// Maximum error message length in characters (2000 chars)
/// Error messages longer than this are truncated with a note about the original length
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 2000;
/// Maximum number of per-item error messages printed in the run summary
pub const MAX_ERRORS_IN_SUMMARY: usize = 10;

// Retry strategy (shop-level only; page fetches are never retried)
/// Initial delay in milliseconds before first retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 15;
/// Default number of retries for a shop whose setup fails
pub const DEFAULT_SHOP_RETRIES: usize = 2;
