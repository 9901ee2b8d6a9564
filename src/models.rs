//! Listing and shop records shared by the extractors, the pipeline and storage.

use chrono::{DateTime, Utc};
use strum_macros::{AsRefStr, Display, EnumString};

/// How far a listing has progressed through the two parsing phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
pub enum ParsingStatus {
    NotParsed,
    BasicParsed,
    DetailedParsed,
}

/// One value on one variant axis (size "M", color "Red").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub axis: String,
    pub value: String,
}

/// A persisted shop row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub url: Option<String>,
}

/// A scraped catalog entry.
///
/// Created by the basic extractor with status `BasicParsed`, then enriched in
/// place by the detail extractor. `product_url` is the deduplication key in
/// two-phase mode; `name` is never empty for an accepted listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Row id, set once persisted
    pub id: Option<i64>,
    pub name: String,
    pub product_url: String,
    pub shop_id: i64,
    pub parsing_status: ParsingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub description: Option<String>,
    /// Price as displayed by the shop, currency markers included
    pub price: Option<String>,
    pub material: Option<String>,
    /// Image URL found on the catalog page
    pub image_url: Option<String>,
    /// Local reference returned by the image store
    pub image_path: Option<String>,
    /// Image URLs found on the product page
    pub images: Vec<String>,
    pub variants: Vec<Variant>,
}

impl Listing {
    /// Creates a basic-phase listing stamped with the current time.
    pub fn basic(name: impl Into<String>, product_url: impl Into<String>, shop_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            product_url: product_url.into(),
            shop_id,
            parsing_status: ParsingStatus::BasicParsed,
            created_at: now,
            updated_at: now,
            description: None,
            price: None,
            material: None,
            image_url: None,
            image_path: None,
            images: Vec::new(),
            variants: Vec::new(),
        }
    }

    /// Short identity for log lines: the URL when present, the name otherwise.
    pub fn identity(&self) -> &str {
        if self.product_url.is_empty() {
            &self.name
        } else {
            &self.product_url
        }
    }
}
