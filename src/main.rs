//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `catalog_scraper` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output and the exit code
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use catalog_scraper::initialization::init_logger_with;
use catalog_scraper::{run_parsing, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // .env in the working directory first, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_parsing(config).await {
        Ok(report) => {
            let totals = report.totals();
            println!(
                "Parsed {} listing{} ({} saved, {} already known, {} failed, {} detailed) in {:.1}s",
                totals.parsed,
                if totals.parsed == 1 { "" } else { "s" },
                totals.saved,
                totals.skipped,
                totals.failed,
                totals.detailed,
                report.elapsed_seconds
            );
            println!("Results saved in {}", report.db_path.display());

            if !report.all_succeeded() {
                eprintln!("Failed shops: {}", report.failed_shops().join(", "));
                process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("catalog_scraper error: {:#}", e);
            process::exit(1);
        }
    }
}
