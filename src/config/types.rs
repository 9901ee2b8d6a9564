//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration. `Config` doubles as the library configuration: it can be
//! built programmatically through `Default` without touching the CLI.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DB_PATH, DEFAULT_MAX_PAGES, DEFAULT_REQUEST_DELAY_MS, DEFAULT_SHOP_RETRIES,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, MAX_ERRORS_IN_SUMMARY,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// How accepted listings of the basic phase are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SaveMode {
    /// One transaction per listing, written as soon as it is accepted
    Streaming,
    /// Collect the whole shop, then write once
    Batch,
}

/// Scraper configuration.
///
/// # Examples
///
/// ```no_run
/// use catalog_scraper::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("catalog.db"),
///     max_pages: 20,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "catalog_scraper",
    about = "Scrapes shop catalogs and stores newly discovered products"
)]
pub struct Config {
    /// Database path (SQLite file)
    #[arg(long, default_value = DB_PATH, env = "CATALOG_SCRAPER_DB_PATH")]
    pub db_path: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Maximum pages visited per catalog base URL
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: u32,

    /// Delay between consecutive page fetches in milliseconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_DELAY_MS)]
    pub request_delay_ms: u64,

    /// How basic-phase listings are persisted
    #[arg(long, value_enum, default_value = "streaming")]
    pub save_mode: SaveMode,

    /// Skip the detail phase (only names and product URLs are collected)
    #[arg(long)]
    pub skip_details: bool,

    /// JSON file with shop profiles (built-in profiles are used when omitted)
    #[arg(long)]
    pub shops_file: Option<PathBuf>,

    /// Only scrape the named shop(s); may be repeated
    #[arg(long = "shop")]
    pub shops: Vec<String>,

    /// Directory for downloaded product images (downloads disabled when omitted)
    #[arg(long)]
    pub image_dir: Option<PathBuf>,

    /// Retries for a shop whose setup fails (persistence lookups, etc.)
    #[arg(long, default_value_t = DEFAULT_SHOP_RETRIES)]
    pub shop_retries: usize,

    /// Maximum per-item error messages printed in the summary
    #[arg(long, default_value_t = MAX_ERRORS_IN_SUMMARY)]
    pub max_errors_in_summary: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DB_PATH),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            save_mode: SaveMode::Streaming,
            skip_details: false,
            shops_file: None,
            shops: Vec::new(),
            image_dir: None,
            shop_retries: DEFAULT_SHOP_RETRIES,
            max_errors_in_summary: MAX_ERRORS_IN_SUMMARY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_pages, 100);
        assert_eq!(config.timeout_seconds, 20);
        assert_eq!(config.save_mode, SaveMode::Streaming);
        assert!(!config.skip_details);
        assert!(config.shops.is_empty());
        assert_eq!(config.db_path, PathBuf::from("./catalog_scraper.db"));
    }

    #[test]
    fn test_cli_defaults_match_default_impl() {
        let parsed = Config::parse_from(["catalog_scraper"]);
        let default = Config::default();
        assert_eq!(parsed.max_pages, default.max_pages);
        assert_eq!(parsed.timeout_seconds, default.timeout_seconds);
        assert_eq!(parsed.save_mode, default.save_mode);
        assert_eq!(parsed.shop_retries, default.shop_retries);
        assert_eq!(parsed.user_agent, default.user_agent);
    }

    #[test]
    fn test_cli_repeated_shop_filter() {
        let parsed = Config::parse_from([
            "catalog_scraper",
            "--shop",
            "alpha",
            "--shop",
            "beta",
            "--save-mode",
            "batch",
            "--skip-details",
        ]);
        assert_eq!(parsed.shops, vec!["alpha".to_string(), "beta".to_string()]);
        assert_eq!(parsed.save_mode, SaveMode::Batch);
        assert!(parsed.skip_details);
    }
}
