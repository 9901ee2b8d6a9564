//! Utility functions shared by the extractors and the pipeline.
//!
//! This module provides:
//! - CSS selector compilation
//! - Link resolution against a page URL
//! - Error message sanitization

pub mod sanitize;
mod selector;
mod url;

pub use selector::{compile_selector, compile_optional_selector, element_text};
pub use url::resolve_link;
