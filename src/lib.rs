//! catalog_scraper library: per-shop catalog scraping into SQLite
//!
//! Shops are described by [`ShopProfile`]s (catalog base URLs, pagination
//! rules and CSS selectors). For each shop the pipeline walks the catalog page
//! by page, drops listings it already knows, saves the new ones and then
//! enriches them from their product pages.
//!
//! # Example
//!
//! ```no_run
//! use catalog_scraper::{run_parsing, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     shops_file: Some("shops.json".into()),
//!     max_pages: 20,
//!     ..Default::default()
//! };
//!
//! let report = run_parsing(config).await?;
//! let totals = report.totals();
//! println!("{} new listings, {} already known", totals.saved, totals.skipped);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

mod app;
pub mod config;
pub mod dedup;
pub mod error_handling;
pub mod fetch;
pub mod images;
pub mod initialization;
pub mod models;
pub mod pagination;
pub mod parse;
pub mod pipeline;
pub mod shops;
pub mod storage;
mod utils;

// Re-export public API
pub use app::{print_error_statistics, print_run_summary};
pub use config::{Config, LogFormat, LogLevel, SaveMode};
pub use dedup::{DedupIndex, DedupPolicy};
pub use error_handling::{ConfigurationError, FetchError, PersistenceError, ProcessingStats};
pub use fetch::{FetchedPage, PageFetcher};
pub use images::{FsImageStore, ImageStore};
pub use models::{Listing, ParsingStatus, Shop, Variant};
pub use pagination::{CatalogPage, CatalogPaginator, PaginationState};
pub use pipeline::{
    PipelineOptions, PipelineOrchestrator, RunCounts, RunKind, RunResult, ShopParser,
};
pub use run::{run_parsing, RunReport};
pub use shops::{CatalogUrlConfig, PaginationRule, ParseMode, SelectorSet, ShopProfile};
pub use storage::{PersistenceGateway, SqliteGateway};
pub use utils::resolve_link;

// Internal run module (wires configuration, storage and the pipeline together)
mod run {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use anyhow::{Context, Result};
    use log::info;

    use crate::app::{print_error_statistics, print_run_summary};
    use crate::config::Config;
    use crate::error_handling::ProcessingStats;
    use crate::fetch::PageFetcher;
    use crate::images::FsImageStore;
    use crate::initialization::init_client;
    use crate::pipeline::{PipelineOptions, PipelineOrchestrator, RunCounts, RunKind, RunResult};
    use crate::shops::{builtin_profiles, load_profiles, select_profiles};
    use crate::storage::{init_db_pool_with_path, run_migrations, SqliteGateway};

    /// Results of one `run_parsing` invocation.
    #[derive(Debug, Clone)]
    pub struct RunReport {
        /// Every phase result, in the order shops were run
        pub results: Vec<RunResult>,
        /// Path to the SQLite database holding the listings
        pub db_path: PathBuf,
        pub elapsed_seconds: f64,
    }

    impl RunReport {
        /// True when every phase of every shop succeeded.
        pub fn all_succeeded(&self) -> bool {
            self.results.iter().all(|r| r.success)
        }

        /// Names of shops with at least one failed phase.
        pub fn failed_shops(&self) -> Vec<&str> {
            let mut names: Vec<&str> = self
                .results
                .iter()
                .filter(|r| !r.success)
                .map(|r| r.shop_name.as_str())
                .collect();
            names.dedup();
            names
        }

        /// Basic-phase counts summed over shops, plus the detail phase's
        /// `detailed` count.
        pub fn totals(&self) -> RunCounts {
            let mut totals = RunCounts::default();
            for result in &self.results {
                if result.kind == RunKind::Detailed {
                    totals.detailed += result.counts.detailed;
                    continue;
                }
                totals.parsed += result.counts.parsed;
                totals.saved += result.counts.saved;
                totals.skipped += result.counts.skipped;
                totals.failed += result.counts.failed;
            }
            totals
        }
    }

    /// Runs every configured shop and prints the summary.
    ///
    /// Shop profiles come from `config.shops_file` when set, the built-in
    /// profiles otherwise, filtered by `config.shops`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the run cannot start: unreadable profiles,
    /// no matching shop, or a database / HTTP client that cannot be set up.
    /// Shop failures are reported in the `RunReport`, never as an error.
    pub async fn run_parsing(config: Config) -> Result<RunReport> {
        let profiles = match &config.shops_file {
            Some(path) => load_profiles(path)?,
            None => builtin_profiles()?,
        };
        let profiles = select_profiles(profiles, &config.shops);
        if profiles.is_empty() {
            anyhow::bail!("No shop profiles to run");
        }

        let pool = init_db_pool_with_path(&config.db_path)
            .await
            .context("Failed to initialize database pool")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        let client = init_client(&config).context("Failed to initialize HTTP client")?;

        let stats = Arc::new(ProcessingStats::new());
        let fetcher = PageFetcher::new(client.clone())
            .with_delay(Duration::from_millis(config.request_delay_ms));
        let options = PipelineOptions {
            save_mode: config.save_mode,
            skip_details: config.skip_details,
            shop_retries: config.shop_retries,
            max_pages: config.max_pages,
        };
        let mut orchestrator = PipelineOrchestrator::new(
            Arc::new(SqliteGateway::new(pool.clone())),
            fetcher,
            Arc::clone(&stats),
            options,
        );
        if let Some(dir) = &config.image_dir {
            info!("Storing product images under {}", dir.display());
            orchestrator = orchestrator.with_image_store(Arc::new(FsImageStore::new(client, dir)));
        }

        info!("Scraping {} shop(s)", profiles.len());
        let start_time = Instant::now();
        let results = orchestrator.run_all(profiles).await;
        let elapsed_seconds = start_time.elapsed().as_secs_f64();

        if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&pool)
            .await
        {
            log::warn!(
                "Failed to checkpoint WAL file (this is non-critical): {}",
                e
            );
        }

        print_error_statistics(&stats);
        print_run_summary(&results, config.max_errors_in_summary);

        Ok(RunReport {
            results,
            db_path: config.db_path.clone(),
            elapsed_seconds,
        })
    }
}
