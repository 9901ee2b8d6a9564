//! The scraping pipeline: per-shop parsing, deduplication and persistence.

mod orchestrator;
mod parser;
mod result;

pub use orchestrator::{PipelineOptions, PipelineOrchestrator};
pub use parser::ShopParser;
pub use result::{RunCounts, RunKind, RunResult};
