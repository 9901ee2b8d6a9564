//! The generic shop parser.

use std::sync::Arc;

use url::Url;

use crate::error_handling::{ConfigurationError, ErrorType, ProcessingStats, WarningType};
use crate::fetch::PageFetcher;
use crate::models::{Listing, ParsingStatus};
use crate::pagination::CatalogPaginator;
use crate::parse::{apply_details, extract_details};
use crate::shops::{CatalogTarget, CompiledSelectors, ParseMode, ShopProfile};

/// One shop's profile, validated and ready to scrape.
///
/// Construction fails with a `ConfigurationError` when the profile cannot
/// drive a parse (no name, no base URL, empty or invalid selectors), so a
/// broken profile is reported before any request is made.
pub struct ShopParser {
    profile: ShopProfile,
    selectors: CompiledSelectors,
    targets: Vec<CatalogTarget>,
    fetcher: PageFetcher,
    stats: Arc<ProcessingStats>,
    max_pages: u32,
}

impl ShopParser {
    pub fn new(
        profile: ShopProfile,
        fetcher: PageFetcher,
        stats: Arc<ProcessingStats>,
        default_max_pages: u32,
    ) -> Result<Self, ConfigurationError> {
        let name = profile.name.trim();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyShopName);
        }
        if profile.base_urls.is_empty() {
            return Err(ConfigurationError::NoBaseUrls {
                shop: name.to_string(),
            });
        }
        if let Some(shop_url) = &profile.shop_url {
            Url::parse(shop_url).map_err(|e| ConfigurationError::InvalidUrl {
                shop: name.to_string(),
                url: shop_url.clone(),
                reason: e.to_string(),
            })?;
        }

        let selectors = profile.selectors.compile(name)?;
        let targets = profile
            .base_urls
            .iter()
            .map(|base| base.compile(name))
            .collect::<Result<Vec<_>, _>>()?;
        let max_pages = profile.max_pages.unwrap_or(default_max_pages).max(1);

        Ok(Self {
            profile,
            selectors,
            targets,
            fetcher,
            stats,
            max_pages,
        })
    }

    pub fn name(&self) -> &str {
        self.profile.name.trim()
    }

    pub fn shop_url(&self) -> Option<&str> {
        self.profile.shop_url.as_deref()
    }

    pub fn mode(&self) -> ParseMode {
        self.profile.mode
    }

    pub fn targets(&self) -> &[CatalogTarget] {
        &self.targets
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// True when the profile declares any product-page selector.
    pub fn has_detail_selectors(&self) -> bool {
        !self.selectors.detail.is_empty()
    }

    /// Starts the traversal of one base URL.
    pub fn paginator<'a>(&'a self, target: &'a CatalogTarget, shop_id: i64) -> CatalogPaginator<'a> {
        CatalogPaginator::new(
            &self.fetcher,
            target,
            &self.selectors,
            &self.stats,
            shop_id,
            self.max_pages,
        )
    }

    /// Basic phase: every listing on every catalog page of every base URL,
    /// in traversal order. A base URL that fails does not stop the others.
    pub async fn parse_basic_products(&self, shop_id: i64) -> Vec<Listing> {
        let mut listings = Vec::new();
        for target in &self.targets {
            let mut paginator = self.paginator(target, shop_id);
            let found = paginator.collect_all().await;
            log::info!(
                "[{}] {} listings from {} ({} pages requested)",
                self.name(),
                found.len(),
                target.base_url,
                paginator.pages_fetched()
            );
            listings.extend(found);
        }
        listings
    }

    /// Detail phase for one listing.
    ///
    /// Returns the listing enriched and marked `DetailedParsed`, or unchanged
    /// (still `BasicParsed`) when it has no product URL, the product page
    /// cannot be fetched, or none of the declared detail fields is found.
    /// Failures are logged as warnings and never propagate.
    pub async fn parse_detailed_product(&self, mut listing: Listing) -> Listing {
        if listing.product_url.trim().is_empty() {
            log::warn!(
                "[{}] Listing '{}' has no product URL; skipping details",
                self.name(),
                listing.name
            );
            self.stats.increment_warning(WarningType::MissingProductUrl);
            return listing;
        }

        let url = match Url::parse(&listing.product_url) {
            Ok(url) => url,
            Err(e) => {
                log::warn!(
                    "[{}] Invalid product URL {}: {}",
                    self.name(),
                    listing.product_url,
                    e
                );
                self.stats.increment_error(ErrorType::DetailFetchFailure);
                return listing;
            }
        };

        let page = match self.fetcher.load(&url).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!(
                    "[{}] Details not fetched for {}: {}",
                    self.name(),
                    listing.identity(),
                    e
                );
                self.stats.increment_error(ErrorType::DetailFetchFailure);
                return listing;
            }
        };

        let details = extract_details(&page.document(), &page.url, &self.selectors.detail);
        if details.is_empty() && self.has_detail_selectors() {
            log::warn!(
                "[{}] No detail fields found on {}",
                self.name(),
                listing.identity()
            );
            self.stats.increment_warning(WarningType::MissingDetailFields);
            return listing;
        }

        apply_details(&mut listing, details);
        debug_assert_eq!(listing.parsing_status, ParsingStatus::DetailedParsed);
        listing
    }

    /// Single-phase parse used by [`ParseMode::LegacySinglePhase`] profiles:
    /// catalog listings with their catalog-page price, no detail fetch.
    ///
    /// Deprecated: kept for shops still configured in legacy mode.
    pub async fn parse_products(&self, shop_id: i64) -> Vec<Listing> {
        if self.selectors.price.is_none() {
            log::warn!(
                "[{}] Legacy parse without a price selector; duplicates are keyed on name only",
                self.name()
            );
        }
        self.parse_basic_products(shop_id).await
    }
}
