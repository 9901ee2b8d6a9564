//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, ProcessingStats, WarningType};
use crate::pipeline::RunResult;

/// Prints error and warning counts to the log.
pub fn print_error_statistics(error_stats: &ProcessingStats) {
    let total_errors = error_stats.total_errors();
    let total_warnings = error_stats.total_warnings();

    if total_errors > 0 {
        info!("Error Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = error_stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }

    if total_warnings > 0 {
        info!("Warning Counts ({} total):", total_warnings);
        for warning_type in WarningType::iter() {
            let count = error_stats.get_warning_count(warning_type);
            if count > 0 {
                info!("   {}: {}", warning_type.as_str(), count);
            }
        }
    }
}

/// `parsed=3 saved=2 skipped=0 failed=1 detailed=2`
pub fn format_counts(result: &RunResult) -> String {
    format!(
        "parsed={} saved={} skipped={} failed={} detailed={}",
        result.counts.parsed,
        result.counts.saved,
        result.counts.skipped,
        result.counts.failed,
        result.counts.detailed
    )
}

/// Prints one line per phase result, followed by at most `max_errors`
/// per-item error messages for each.
pub fn print_run_summary(results: &[RunResult], max_errors: usize) {
    info!("Run summary ({} phase results):", results.len());
    for result in results {
        let status = if result.success { "ok" } else { "FAILED" };
        info!(
            "   {} [{}] {}: {} ({:.1}s)",
            result.shop_name,
            result.kind,
            status,
            format_counts(result),
            result.elapsed_seconds()
        );
        if let Some(error) = &result.error {
            info!("      error: {}", error);
        }
        for message in summary_errors(result, max_errors) {
            info!("      {}", message);
        }
    }
}

/// Per-item errors to show, with a trailing "and N more" line when cut.
fn summary_errors(result: &RunResult, max_errors: usize) -> Vec<String> {
    let mut lines: Vec<String> = result
        .errors
        .iter()
        .take(max_errors)
        .map(|e| format!("- {}", e))
        .collect();
    let hidden = result.errors.len().saturating_sub(max_errors);
    if hidden > 0 {
        lines.push(format!("... and {} more", hidden));
    }
    lines
}
