//! Run bookkeeping.
//!
//! One `parse_runs` row per finished shop phase, so past runs can be reviewed
//! after the terminal is closed.

use sqlx::SqlitePool;

use crate::error_handling::PersistenceError;
use crate::pipeline::RunResult;

/// Inserts a finished run into `parse_runs`.
pub async fn insert_run_result(
    pool: &SqlitePool,
    result: &RunResult,
) -> Result<(), PersistenceError> {
    let finished = result.finished_at.unwrap_or_else(chrono::Utc::now);

    sqlx::query(
        "INSERT INTO parse_runs (
            shop_name, kind, parsed, saved, skipped, failed, detailed,
            success, error, started_at_ms, finished_at_ms
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&result.shop_name)
    .bind(result.kind.as_ref())
    .bind(result.counts.parsed as i64)
    .bind(result.counts.saved as i64)
    .bind(result.counts.skipped as i64)
    .bind(result.counts.failed as i64)
    .bind(result.counts.detailed as i64)
    .bind(result.success)
    .bind(&result.error)
    .bind(result.started_at.timestamp_millis())
    .bind(finished.timestamp_millis())
    .execute(pool)
    .await?;

    Ok(())
}

/// A stored run, most recent first from [`query_run_history`].
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RunRecord {
    pub shop_name: String,
    pub kind: String,
    pub parsed: i64,
    pub saved: i64,
    pub skipped: i64,
    pub failed: i64,
    pub detailed: i64,
    pub success: bool,
    pub error: Option<String>,
    pub started_at_ms: i64,
    pub finished_at_ms: i64,
}

/// Returns stored runs, newest first, optionally limited.
pub async fn query_run_history(
    pool: &SqlitePool,
    limit: Option<u32>,
) -> Result<Vec<RunRecord>, PersistenceError> {
    let records = sqlx::query_as::<_, RunRecord>(
        "SELECT shop_name, kind, parsed, saved, skipped, failed, detailed,
                success, error, started_at_ms, finished_at_ms
         FROM parse_runs
         ORDER BY started_at_ms DESC, id DESC
         LIMIT ?",
    )
    .bind(limit.map(i64::from).unwrap_or(-1))
    .fetch_all(pool)
    .await?;
    Ok(records)
}
