//! Page-by-page traversal of one catalog base URL.
//!
//! [`CatalogPaginator`] is an explicit state machine:
//!
//! ```text
//! Start -> FetchingPage -> ExtractingPage -> ComputingNextUrl -> FetchingPage
//!                |               |                  |
//!                +---------------+------------------+----> Done
//! ```
//!
//! Traversal ends on the first page that yields no listings, when the rule
//! gives no next URL, when the page ceiling is reached, or when a page repeats
//! the previous one. A fetch failure ends traversal of this base URL only and
//! is treated like an empty page.

use std::collections::HashSet;

use url::Url;

use crate::error_handling::ProcessingStats;
use crate::fetch::{FetchedPage, PageFetcher};
use crate::models::Listing;
use crate::parse::{extract_listings, extract_next_link};
use crate::shops::{CatalogTarget, CompiledSelectors, PaginationStep};

/// Where the traversal currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub current_url: Url,
    pub page_number: u32,
}

/// Listings found on one catalog page.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub url: Url,
    pub page_number: u32,
    pub listings: Vec<Listing>,
}

#[derive(Debug)]
enum TraversalState {
    Start,
    FetchingPage(PaginationState),
    ExtractingPage(PaginationState, FetchedPage),
    ComputingNextUrl {
        state: PaginationState,
        next_link: Option<Url>,
    },
    Done,
}

/// Drives the traversal of one `CatalogTarget`.
///
/// Call [`CatalogPaginator::next_page`] until it returns `None`.
pub struct CatalogPaginator<'a> {
    fetcher: &'a PageFetcher,
    target: &'a CatalogTarget,
    selectors: &'a CompiledSelectors,
    stats: &'a ProcessingStats,
    shop_id: i64,
    max_pages: u32,
    state: TraversalState,
    visited: HashSet<Url>,
    previous_urls: Vec<String>,
    pages_fetched: u32,
}

impl<'a> CatalogPaginator<'a> {
    pub fn new(
        fetcher: &'a PageFetcher,
        target: &'a CatalogTarget,
        selectors: &'a CompiledSelectors,
        stats: &'a ProcessingStats,
        shop_id: i64,
        max_pages: u32,
    ) -> Self {
        Self {
            fetcher,
            target,
            selectors,
            stats,
            shop_id,
            max_pages,
            state: TraversalState::Start,
            visited: HashSet::new(),
            previous_urls: Vec::new(),
            pages_fetched: 0,
        }
    }

    /// Number of page loads attempted so far.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, TraversalState::Done)
    }

    /// Advances the traversal to the next page that yields listings.
    ///
    /// Returns `None` once traversal is over; further calls keep returning
    /// `None` without touching the network.
    pub async fn next_page(&mut self) -> Option<CatalogPage> {
        loop {
            match std::mem::replace(&mut self.state, TraversalState::Done) {
                TraversalState::Start => {
                    self.state = TraversalState::FetchingPage(PaginationState {
                        current_url: self.target.base_url.clone(),
                        page_number: 1,
                    });
                }
                TraversalState::FetchingPage(state) => {
                    self.visited.insert(state.current_url.clone());
                    self.pages_fetched += 1;
                    match self.fetcher.load(&state.current_url).await {
                        Ok(page) => {
                            self.visited.insert(page.url.clone());
                            self.state = TraversalState::ExtractingPage(state, page);
                        }
                        Err(e) => {
                            log::warn!(
                                "Stopping pagination at page {} ({}): {}",
                                state.page_number,
                                state.current_url,
                                e
                            );
                            self.stats.increment_error(e.error_type());
                            return None;
                        }
                    }
                }
                TraversalState::ExtractingPage(state, page) => {
                    let (listings, next_link) = self.extract(&page);

                    if listings.is_empty() {
                        log::debug!(
                            "Page {} ({}) has no listings; end of catalog",
                            state.page_number,
                            page.url
                        );
                        return None;
                    }

                    let urls: Vec<String> =
                        listings.iter().map(|l| l.product_url.clone()).collect();
                    if urls == self.previous_urls {
                        log::info!(
                            "Page {} ({}) repeats the previous page; end of catalog",
                            state.page_number,
                            page.url
                        );
                        return None;
                    }
                    self.previous_urls = urls;

                    log::info!(
                        "Page {}: {} listings from {}",
                        state.page_number,
                        listings.len(),
                        page.url
                    );
                    let result = CatalogPage {
                        url: page.url,
                        page_number: state.page_number,
                        listings,
                    };
                    self.state = TraversalState::ComputingNextUrl { state, next_link };
                    return Some(result);
                }
                TraversalState::ComputingNextUrl { state, next_link } => {
                    let next_number = state.page_number + 1;
                    if next_number > self.max_pages {
                        log::warn!(
                            "Reached the {} page ceiling for {}",
                            self.max_pages,
                            self.target.base_url
                        );
                        return None;
                    }

                    let next_url = match &self.target.pagination {
                        PaginationStep::None => None,
                        PaginationStep::Template(_) => {
                            self.target.template_page_url(next_number)
                        }
                        PaginationStep::NextLink(_) => next_link,
                    };
                    let Some(next_url) = next_url else {
                        log::debug!("No next page after {}", state.current_url);
                        return None;
                    };
                    if self.visited.contains(&next_url) {
                        log::debug!("Next page {} was already visited", next_url);
                        return None;
                    }

                    self.state = TraversalState::FetchingPage(PaginationState {
                        current_url: next_url,
                        page_number: next_number,
                    });
                }
                TraversalState::Done => return None,
            }
        }
    }

    /// Runs the traversal to the end and concatenates every page's listings.
    pub async fn collect_all(&mut self) -> Vec<Listing> {
        let mut listings = Vec::new();
        while let Some(page) = self.next_page().await {
            listings.extend(page.listings);
        }
        listings
    }

    fn extract(&self, page: &FetchedPage) -> (Vec<Listing>, Option<Url>) {
        let document = page.document();
        let listings = extract_listings(
            &document,
            &page.url,
            self.selectors,
            self.shop_id,
            self.stats,
        );
        let next_link = match &self.target.pagination {
            PaginationStep::NextLink(selector) => {
                extract_next_link(&document, &page.url, selector)
            }
            _ => None,
        };
        (listings, next_link)
    }
}
