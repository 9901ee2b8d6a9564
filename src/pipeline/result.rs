//! Per-shop run summaries.

use chrono::{DateTime, Utc};
use strum_macros::{AsRefStr, Display};

use crate::models::Listing;
use crate::utils::sanitize::sanitize_and_truncate_error_message;

/// Which phase produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RunKind {
    /// Basic phase with one batch save at the end
    Basic,
    /// Detail phase over previously parsed listings
    Detailed,
    /// Basic phase saving each listing as soon as it is accepted
    Streaming,
    /// Deprecated single-phase parse
    Legacy,
}

/// Listing tallies for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    /// Listings extracted from catalog pages
    pub parsed: usize,
    pub saved: usize,
    /// Duplicates filtered before persistence
    pub skipped: usize,
    /// Listings whose save was rejected
    pub failed: usize,
    /// Listings enriched by the detail phase
    pub detailed: usize,
}

/// Outcome of one phase for one shop.
///
/// `success` is false only when the phase itself failed (the shop could not be
/// set up, the batch save was rejected, the pipeline panicked). Individual
/// rejected listings are counted in `failed` and described in `errors`.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub kind: RunKind,
    pub shop_name: String,
    pub counts: RunCounts,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub success: bool,
    pub error: Option<String>,
    pub errors: Vec<String>,
    pub saved_products: Vec<Listing>,
}

impl RunResult {
    pub fn start(kind: RunKind, shop_name: impl Into<String>) -> Self {
        Self {
            kind,
            shop_name: shop_name.into(),
            counts: RunCounts::default(),
            started_at: Utc::now(),
            finished_at: None,
            success: false,
            error: None,
            errors: Vec::new(),
            saved_products: Vec::new(),
        }
    }

    /// Records a per-item failure message.
    pub fn record_error(&mut self, message: impl AsRef<str>) {
        self.errors.push(sanitize_and_truncate_error_message(message.as_ref()));
    }

    /// Finishes the run successfully.
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self.success = self.error.is_none();
        self
    }

    /// Finishes the run as failed with `error` as the cause.
    pub fn fail(mut self, error: impl AsRef<str>) -> Self {
        self.error = Some(sanitize_and_truncate_error_message(error.as_ref()));
        self.finished_at = Some(Utc::now());
        self.success = false;
        self
    }

    pub fn elapsed_seconds(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
