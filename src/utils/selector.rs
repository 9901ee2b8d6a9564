//! CSS selector parsing utilities.

use scraper::{ElementRef, Selector};

use crate::error_handling::ConfigurationError;

/// Compiles a required selector for `shop`.
///
/// Empty selectors and selectors that fail to parse are configuration errors;
/// a shop cannot start without its required selectors.
pub fn compile_selector(
    shop: &str,
    field: &'static str,
    selector_str: &str,
) -> Result<Selector, ConfigurationError> {
    let trimmed = selector_str.trim();
    if trimmed.is_empty() {
        return Err(ConfigurationError::MissingSelector {
            shop: shop.to_string(),
            field,
        });
    }
    Selector::parse(trimmed).map_err(|e| ConfigurationError::InvalidSelector {
        shop: shop.to_string(),
        field: field.to_string(),
        selector: selector_str.to_string(),
        reason: e.to_string(),
    })
}

/// Compiles an optional selector.
///
/// `None` and blank strings mean "field not declared" and yield `Ok(None)`;
/// a declared selector must still parse.
pub fn compile_optional_selector(
    shop: &str,
    field: &str,
    selector_str: Option<&str>,
) -> Result<Option<Selector>, ConfigurationError> {
    match selector_str.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Selector::parse(s)
            .map(Some)
            .map_err(|e| ConfigurationError::InvalidSelector {
                shop: shop.to_string(),
                field: field.to_string(),
                selector: s.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// Collects the text of an element with whitespace runs collapsed.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
