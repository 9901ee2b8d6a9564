//! The persistence interface the pipeline writes through.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error_handling::PersistenceError;
use crate::models::{Listing, Shop};
use crate::pipeline::RunResult;

/// Store for shops and listings.
///
/// Implementations must keep `save_one` isolated: each call is its own unit of
/// work, so a rejected listing never undoes earlier saves and never prevents
/// the next one. Ordinary save failures are returned as errors, not panics.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Returns the shop named `name`, creating it when missing.
    async fn ensure_shop_exists(
        &self,
        name: &str,
        url: Option<&str>,
    ) -> Result<Shop, PersistenceError>;

    /// Product URLs already stored for the shop.
    async fn known_product_urls(&self, shop: &Shop) -> Result<HashSet<String>, PersistenceError>;

    /// `(name, raw price)` pairs already stored for the shop.
    async fn known_name_price_pairs(
        &self,
        shop: &Shop,
    ) -> Result<Vec<(String, Option<String>)>, PersistenceError>;

    /// Stored listings of the shop still waiting for their detail phase
    /// (`BasicParsed`), oldest first.
    async fn unresolved_listings(&self, shop: &Shop) -> Result<Vec<Listing>, PersistenceError>;

    /// Saves one listing in its own transaction and returns its row id.
    async fn save_one(&self, listing: &Listing) -> Result<i64, PersistenceError>;

    /// Saves `listings` and returns, per input listing, the new row id or
    /// `None` when the store skipped it. Atomicity is whatever the underlying
    /// store offers.
    async fn save_many(&self, listings: &[Listing]) -> Result<Vec<Option<i64>>, PersistenceError>;

    /// Writes detail-phase fields of an already saved listing.
    async fn update_listing(&self, listing: &Listing) -> Result<(), PersistenceError>;

    /// Keeps a record of a finished run. Stores without run history ignore it.
    async fn record_run(&self, _result: &RunResult) -> Result<(), PersistenceError> {
        Ok(())
    }
}
