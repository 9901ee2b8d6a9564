//! Duplicate filtering for one shop's run.
//!
//! The index is seeded from persisted state when a shop's basic phase starts
//! and grows as listings are accepted, so a product seen on page 1 and again
//! on page 4 is only saved once. Each run owns its own index.

use std::collections::HashSet;

use crate::models::Listing;
use crate::parse::normalize_price;

/// Which identity a shop's listings are compared by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Product URL (two-phase mode)
    ProductUrl,
    /// Name plus normalized price (legacy single-phase mode)
    NamePrice,
}

/// Set of listing keys already known for one shop.
#[derive(Debug, Clone)]
pub struct DedupIndex {
    policy: DedupPolicy,
    known: HashSet<String>,
}

impl DedupIndex {
    /// An index seeded with known product URLs.
    pub fn by_url<I>(known_urls: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            policy: DedupPolicy::ProductUrl,
            known: known_urls.into_iter().collect(),
        }
    }

    /// An index seeded with persisted `(name, price)` pairs; prices are
    /// normalized here.
    pub fn by_name_price<I>(known_pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        Self {
            policy: DedupPolicy::NamePrice,
            known: known_pairs
                .into_iter()
                .map(|(name, price)| name_price_key(&name, price.as_deref()))
                .collect(),
        }
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    fn key(&self, listing: &Listing) -> String {
        match self.policy {
            DedupPolicy::ProductUrl => listing.product_url.clone(),
            DedupPolicy::NamePrice => name_price_key(&listing.name, listing.price.as_deref()),
        }
    }

    pub fn is_duplicate(&self, listing: &Listing) -> bool {
        self.known.contains(&self.key(listing))
    }

    /// Records `listing` as known. Returns `false` when it already was.
    pub fn accept(&mut self, listing: &Listing) -> bool {
        let key = self.key(listing);
        self.known.insert(key)
    }

    /// Splits `listings` into new ones (accepted in order) and the number of
    /// duplicates dropped.
    pub fn filter_new(&mut self, listings: Vec<Listing>) -> (Vec<Listing>, usize) {
        let mut fresh = Vec::with_capacity(listings.len());
        let mut skipped = 0;
        for listing in listings {
            if self.accept(&listing) {
                fresh.push(listing);
            } else {
                skipped += 1;
            }
        }
        (fresh, skipped)
    }
}

/// Composite legacy key. The separator cannot occur in trimmed names.
fn name_price_key(name: &str, price: Option<&str>) -> String {
    format!(
        "{}\u{1f}{}",
        name.trim(),
        price.map(normalize_price).unwrap_or_default()
    )
}
