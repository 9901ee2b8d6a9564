//! Catalog page extraction.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::error_handling::{ErrorType, ProcessingStats, WarningType};
use crate::models::Listing;
use crate::shops::CompiledSelectors;
use crate::utils::{element_text, resolve_link};

/// Attributes holding an image URL, in order of preference (lazy-loading first).
const IMAGE_ATTRS: &[&str] = &["data-src", "data-original", "data-lazy", "src"];

/// Why a product container did not yield a listing.
#[derive(Error, Debug, PartialEq, Eq)]
enum NodeError {
    #[error("no product name")]
    MissingName,
    #[error("no product link")]
    MissingLink,
    #[error("unusable product link {0:?}")]
    InvalidLink(String),
}

/// Extracts every listing on a catalog page.
///
/// Each element matching `product_container` is handled on its own: a node
/// without a name or a usable link is skipped and logged, the rest of the page
/// is still extracted. Links are resolved against `page_url`.
pub fn extract_listings(
    document: &Html,
    page_url: &Url,
    selectors: &CompiledSelectors,
    shop_id: i64,
    stats: &ProcessingStats,
) -> Vec<Listing> {
    let mut listings = Vec::new();

    for (index, node) in document.select(&selectors.product_container).enumerate() {
        match extract_node(&node, page_url, selectors, shop_id) {
            Ok(listing) => {
                if selectors.price.is_some() && listing.price.is_none() {
                    stats.increment_warning(WarningType::MissingPrice);
                }
                if selectors.image.is_some() && listing.image_url.is_none() {
                    stats.increment_warning(WarningType::MissingImage);
                }
                listings.push(listing);
            }
            Err(e) => {
                match e {
                    NodeError::MissingName => stats.increment_warning(WarningType::MissingName),
                    NodeError::MissingLink => {
                        stats.increment_warning(WarningType::MissingProductLink)
                    }
                    NodeError::InvalidLink(_) => {
                        stats.increment_error(ErrorType::ListingExtractError)
                    }
                }
                log::debug!(
                    "Skipping product node #{} on {}: {}",
                    index + 1,
                    page_url,
                    e
                );
            }
        }
    }

    log::debug!("Extracted {} listings from {}", listings.len(), page_url);
    listings
}

fn extract_node(
    node: &ElementRef<'_>,
    page_url: &Url,
    selectors: &CompiledSelectors,
    shop_id: i64,
) -> Result<Listing, NodeError> {
    let name = node
        .select(&selectors.name)
        .next()
        .map(|el| {
            let text = element_text(&el);
            if text.is_empty() {
                el.value().attr("title").unwrap_or_default().trim().to_string()
            } else {
                text
            }
        })
        .filter(|name| !name.is_empty())
        .ok_or(NodeError::MissingName)?;

    let href = node
        .select(&selectors.product_link)
        .find_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or(NodeError::MissingLink)?;
    let product_url =
        resolve_link(page_url, href).ok_or_else(|| NodeError::InvalidLink(href.to_string()))?;

    let mut listing = Listing::basic(name, product_url, shop_id);
    listing.price = selectors
        .price
        .as_ref()
        .and_then(|selector| first_text(node, selector));
    listing.image_url = selectors
        .image
        .as_ref()
        .and_then(|selector| node.select(selector).find_map(|el| image_source(&el)))
        .and_then(|src| resolve_link(page_url, src));

    Ok(listing)
}

/// Finds the "next page" link on a catalog page, resolved against `page_url`.
pub fn extract_next_link(document: &Html, page_url: &Url, selector: &Selector) -> Option<Url> {
    document
        .select(selector)
        .find_map(|el| el.value().attr("href"))
        .and_then(|href| resolve_link(page_url, href))
        .and_then(|link| Url::parse(&link).ok())
}

pub(crate) fn first_text(scope: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
}

pub(crate) fn image_source<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    IMAGE_ATTRS
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(str::trim)
        .find(|src| !src.is_empty() && !src.starts_with("data:"))
}
