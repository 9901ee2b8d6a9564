//! Catalog base URLs and pagination rules.

use std::path::Path;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PAGE_PLACEHOLDER;
use crate::error_handling::ConfigurationError;
use crate::utils::compile_selector;

/// How to reach page n+1 of a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaginationRule {
    /// Substitute the page number into `template` (e.g. `?PAGEN_1={page}`).
    /// The result is resolved against the base URL, so it may be relative.
    /// Page 1 is always the base URL itself.
    Template { template: String },
    /// Follow the `href` of the first element matching `selector`.
    NextLink { selector: String },
}

/// One catalog entry point of a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogUrlConfig {
    /// `http(s)://` URL, `file://` URL, or a filesystem path to a captured page
    pub url: String,
    #[serde(default)]
    pub pagination: Option<PaginationRule>,
}

/// Pagination rule with its selector parsed.
#[derive(Debug, Clone)]
pub enum PaginationStep {
    None,
    Template(String),
    NextLink(Selector),
}

/// A validated `CatalogUrlConfig`.
#[derive(Debug, Clone)]
pub struct CatalogTarget {
    pub base_url: Url,
    pub pagination: PaginationStep,
}

impl CatalogUrlConfig {
    pub fn new(url: impl Into<String>, pagination: Option<PaginationRule>) -> Self {
        Self {
            url: url.into(),
            pagination,
        }
    }

    /// Validates the URL and the pagination rule for `shop`.
    pub fn compile(&self, shop: &str) -> Result<CatalogTarget, ConfigurationError> {
        let base_url = parse_locator(&self.url).map_err(|reason| ConfigurationError::InvalidUrl {
            shop: shop.to_string(),
            url: self.url.clone(),
            reason,
        })?;

        let pagination = match &self.pagination {
            None => PaginationStep::None,
            Some(PaginationRule::Template { template }) => {
                if !template.contains(PAGE_PLACEHOLDER) {
                    return Err(ConfigurationError::InvalidPaginationTemplate {
                        shop: shop.to_string(),
                        template: template.clone(),
                    });
                }
                PaginationStep::Template(template.clone())
            }
            Some(PaginationRule::NextLink { selector }) => {
                PaginationStep::NextLink(compile_selector(shop, "pagination.next_link", selector)?)
            }
        };

        Ok(CatalogTarget {
            base_url,
            pagination,
        })
    }
}

impl CatalogTarget {
    /// URL of `page` under a template rule; `None` for other rules or when the
    /// substituted template does not resolve.
    pub fn template_page_url(&self, page: u32) -> Option<Url> {
        match &self.pagination {
            PaginationStep::Template(template) => {
                let substituted = template.replace(PAGE_PLACEHOLDER, &page.to_string());
                self.base_url.join(&substituted).ok()
            }
            _ => None,
        }
    }
}

/// Turns a configured locator into a URL.
///
/// Anything that parses as an absolute URL is taken as is; anything else is a
/// filesystem path, made absolute against the working directory.
pub(crate) fn parse_locator(locator: &str) -> Result<Url, String> {
    let trimmed = locator.trim();
    if trimmed.is_empty() {
        return Err("empty URL".to_string());
    }
    match Url::parse(trimmed) {
        Ok(url) => match url.scheme() {
            "http" | "https" | "file" => Ok(url),
            other => Err(format!("unsupported scheme '{}'", other)),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = Path::new(trimmed);
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map_err(|e| e.to_string())?
                    .join(path)
            };
            Url::from_file_path(&absolute)
                .map_err(|_| format!("cannot convert path {} to a URL", absolute.display()))
        }
        Err(e) => Err(e.to_string()),
    }
}
