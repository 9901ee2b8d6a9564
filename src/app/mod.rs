//! Run summary output used by the library and the binary.

pub mod statistics;

pub use statistics::{print_error_statistics, print_run_summary};
