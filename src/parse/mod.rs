//! HTML extraction.
//!
//! - `basic`: listings (name, product URL, optional price and image) from a catalog page
//! - `detail`: enrichment fields from a product's own page
//! - `price`: price normalization for the legacy name + price duplicate key
//!
//! All parsing is done using CSS selectors via the `scraper` crate. Functions
//! here are synchronous and take an already parsed `Html`.

mod basic;
mod detail;
mod price;

pub use basic::{extract_listings, extract_next_link};
pub use detail::{apply_details, extract_details, ProductDetails};
pub use price::normalize_price;
