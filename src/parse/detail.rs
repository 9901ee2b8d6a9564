//! Product page extraction.

use chrono::Utc;
use scraper::Html;
use url::Url;

use super::basic::{first_text, image_source};
use crate::models::{Listing, ParsingStatus, Variant};
use crate::shops::CompiledDetailSelectors;
use crate::utils::{element_text, resolve_link};

/// Fields found on a product page. Undeclared or absent fields stay empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDetails {
    pub description: Option<String>,
    pub price: Option<String>,
    pub material: Option<String>,
    pub images: Vec<String>,
    pub variants: Vec<Variant>,
}

impl ProductDetails {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.price.is_none()
            && self.material.is_none()
            && self.images.is_empty()
            && self.variants.is_empty()
    }
}

/// Extracts the declared detail fields from a product page.
pub fn extract_details(
    document: &Html,
    page_url: &Url,
    selectors: &CompiledDetailSelectors,
) -> ProductDetails {
    let root = document.root_element();

    let description = selectors.description.as_ref().and_then(|selector| {
        let paragraphs: Vec<String> = document
            .select(selector)
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
            .collect();
        (!paragraphs.is_empty()).then(|| paragraphs.join("\n"))
    });

    let price = selectors
        .price
        .as_ref()
        .and_then(|selector| first_text(&root, selector));
    let material = selectors
        .material
        .as_ref()
        .and_then(|selector| first_text(&root, selector));

    let mut images: Vec<String> = Vec::new();
    if let Some(selector) = &selectors.images {
        for el in document.select(selector) {
            let src = image_source(&el).or_else(|| el.value().attr("href"));
            if let Some(url) = src.and_then(|src| resolve_link(page_url, src)) {
                if !images.contains(&url) {
                    images.push(url);
                }
            }
        }
    }

    let mut variants: Vec<Variant> = Vec::new();
    for (axis, selector) in &selectors.variants {
        for el in document.select(selector) {
            let text = element_text(&el);
            let value = if text.is_empty() {
                el.value()
                    .attr("data-value")
                    .or_else(|| el.value().attr("value"))
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            } else {
                text
            };
            if value.is_empty() {
                continue;
            }
            let variant = Variant {
                axis: axis.clone(),
                value,
            };
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }
    }

    ProductDetails {
        description,
        price,
        material,
        images,
        variants,
    }
}

/// Merges extracted details into a listing and marks it `DetailedParsed`.
///
/// Fields absent from the product page keep their basic-phase values (a
/// catalog price is not erased by a product page without one).
pub fn apply_details(listing: &mut Listing, details: ProductDetails) {
    if details.description.is_some() {
        listing.description = details.description;
    }
    if details.price.is_some() {
        listing.price = details.price;
    }
    if details.material.is_some() {
        listing.material = details.material;
    }
    if !details.images.is_empty() {
        listing.images = details.images;
    }
    if !details.variants.is_empty() {
        listing.variants = details.variants;
    }
    listing.parsing_status = ParsingStatus::DetailedParsed;
    listing.updated_at = Utc::now();
}
