//! Error type definitions.
//!
//! This module defines the error and warning types used throughout the scraper.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Failure to obtain a document for a locator.
///
/// Transport problems (`Network`, `Timeout`, `Status`, `Io`) and undecodable
/// content (`ParseFailure`) share one channel so the paginator and the detail
/// extractor only have a single error to recover from.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection-level failure (DNS, refused connection, reset, TLS).
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: ReqwestError,
    },

    /// The transport gave up waiting for the response.
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// Reading a local fixture failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The locator or the body could not be turned into a document.
    #[error("cannot parse document at {locator}: {reason}")]
    ParseFailure { locator: String, reason: String },
}

impl FetchError {
    /// Categorizes a `reqwest::Error` raised while fetching `url`.
    pub fn from_reqwest(url: &str, error: ReqwestError) -> Self {
        if error.is_timeout() {
            return FetchError::Timeout {
                url: url.to_string(),
            };
        }
        if let Some(status) = error.status() {
            return FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            };
        }
        if error.is_decode() || error.is_body() {
            return FetchError::ParseFailure {
                locator: url.to_string(),
                reason: error.to_string(),
            };
        }
        FetchError::Network {
            url: url.to_string(),
            source: error,
        }
    }

    /// Maps the failure to its statistics bucket.
    pub fn error_type(&self) -> ErrorType {
        match self {
            FetchError::Network { .. } | FetchError::Io { .. } => ErrorType::PageFetchNetwork,
            FetchError::Timeout { .. } => ErrorType::PageFetchTimeout,
            FetchError::Status { .. } => ErrorType::PageFetchStatus,
            FetchError::ParseFailure { .. } => ErrorType::PageParseFailure,
        }
    }
}

/// Error types for persistence operations.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Applying schema migrations failed.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// The store refused the write for a reason other than SQL (validation, unknown shop).
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// A shop profile that cannot drive a parser.
///
/// Raised when a `ShopParser` is constructed; a shop with a configuration
/// error never starts scraping.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A selector the basic phase needs is empty.
    #[error("shop '{shop}': required selector '{field}' is empty")]
    MissingSelector { shop: String, field: &'static str },

    /// A selector does not parse as CSS.
    #[error("shop '{shop}': selector '{field}' = {selector:?} is invalid: {reason}")]
    InvalidSelector {
        shop: String,
        field: String,
        selector: String,
        reason: String,
    },

    /// The shop declares no catalog base URL.
    #[error("shop '{shop}' has no catalog base URLs")]
    NoBaseUrls { shop: String },

    /// A base URL or the shop URL is not an absolute URL.
    #[error("shop '{shop}': invalid URL {url:?}: {reason}")]
    InvalidUrl {
        shop: String,
        url: String,
        reason: String,
    },

    /// A pagination template lacks the page placeholder.
    #[error("shop '{shop}': pagination template {template:?} has no {{page}} placeholder")]
    InvalidPaginationTemplate { shop: String, template: String },

    /// The shop name is empty.
    #[error("shop profile has an empty name")]
    EmptyShopName,
}

/// Types of errors that can occur while scraping a shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // Catalog page fetch errors
    PageFetchNetwork,
    PageFetchTimeout,
    PageFetchStatus,
    PageParseFailure,
    // Per-listing errors
    ListingExtractError,
    ListingSaveFailure,
    // Enrichment errors
    DetailFetchFailure,
    DetailUpdateFailure,
    ImageFetchFailure,
    // Shop-level failures (setup, persistence lookups, panics)
    ShopFailure,
}

/// Types of warnings that can occur while scraping a shop.
///
/// Warnings indicate missing optional data that doesn't prevent a listing from
/// being accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
#[allow(clippy::enum_variant_names)] // All variants start with "Missing" by design
pub enum WarningType {
    MissingName,
    MissingProductLink,
    MissingPrice,
    MissingImage,
    MissingProductUrl,
    MissingDetailFields,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::PageFetchNetwork => "Catalog page network error",
            ErrorType::PageFetchTimeout => "Catalog page timeout",
            ErrorType::PageFetchStatus => "Catalog page HTTP status error",
            ErrorType::PageParseFailure => "Catalog page parse failure",
            ErrorType::ListingExtractError => "Listing extraction error",
            ErrorType::ListingSaveFailure => "Listing save failure",
            ErrorType::DetailFetchFailure => "Product page fetch failure",
            ErrorType::DetailUpdateFailure => "Product detail update failure",
            ErrorType::ImageFetchFailure => "Image download failure",
            ErrorType::ShopFailure => "Shop run failure",
        }
    }
}

impl WarningType {
    /// Returns a human-readable string representation of the warning type.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningType::MissingName => "Missing product name",
            WarningType::MissingProductLink => "Missing product link",
            WarningType::MissingPrice => "Missing price",
            WarningType::MissingImage => "Missing image",
            WarningType::MissingProductUrl => "Missing product URL for detail parsing",
            WarningType::MissingDetailFields => "No detail fields found",
        }
    }
}
