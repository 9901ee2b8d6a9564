//! Runs shops through the pipeline and collects their results.
//!
//! Each shop is processed on its own: a configuration error, a persistence
//! outage or a panic inside one shop becomes that shop's failed `RunResult`
//! and the next shop still runs. Within a shop, pages and listings are handled
//! strictly in order.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Context;
use futures::FutureExt;
use tokio_retry::Retry;

use crate::config::SaveMode;
use crate::dedup::DedupIndex;
use crate::error_handling::{get_retry_strategy, ConfigurationError, ErrorType, ProcessingStats};
use crate::fetch::PageFetcher;
use crate::images::ImageStore;
use crate::models::{Listing, ParsingStatus, Shop};
use crate::shops::{ParseMode, ShopProfile};
use crate::storage::PersistenceGateway;

use super::parser::ShopParser;
use super::result::{RunKind, RunResult};

/// Knobs for one orchestrated run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub save_mode: SaveMode,
    pub skip_details: bool,
    /// Extra attempts for a shop whose basic phase fails outright
    pub shop_retries: usize,
    /// Page ceiling for profiles that do not set their own
    pub max_pages: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            save_mode: SaveMode::Streaming,
            skip_details: false,
            shop_retries: crate::config::DEFAULT_SHOP_RETRIES,
            max_pages: crate::config::DEFAULT_MAX_PAGES,
        }
    }
}

/// Composes parser, deduplication, persistence and image storage per shop.
pub struct PipelineOrchestrator {
    gateway: Arc<dyn PersistenceGateway>,
    images: Option<Arc<dyn ImageStore>>,
    fetcher: PageFetcher,
    stats: Arc<ProcessingStats>,
    options: PipelineOptions,
}

impl PipelineOrchestrator {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        fetcher: PageFetcher,
        stats: Arc<ProcessingStats>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            gateway,
            images: None,
            fetcher,
            stats,
            options,
        }
    }

    /// Downloads listing images through `store`.
    pub fn with_image_store(mut self, store: Arc<dyn ImageStore>) -> Self {
        self.images = Some(store);
        self
    }

    pub fn stats(&self) -> &Arc<ProcessingStats> {
        &self.stats
    }

    /// Builds the parser for `profile`.
    pub fn parser_for(
        &self,
        profile: ShopProfile,
    ) -> Result<ShopParser, ConfigurationError> {
        ShopParser::new(
            profile,
            self.fetcher.clone(),
            Arc::clone(&self.stats),
            self.options.max_pages,
        )
    }

    /// Runs every shop in order and returns all phase results.
    ///
    /// Each result is also handed to the gateway's run history.
    pub async fn run_all(&self, shops: Vec<ShopProfile>) -> Vec<RunResult> {
        let mut results = Vec::new();

        for profile in shops {
            let shop_name = profile.name.clone();
            log::info!("[{}] Starting", shop_name);

            let shop_results = match self.parser_for(profile) {
                Ok(parser) => {
                    match AssertUnwindSafe(self.run_shop(&parser)).catch_unwind().await {
                        Ok(results) => results,
                        Err(panic) => {
                            let message = panic_message(panic.as_ref());
                            log::error!("[{}] Pipeline panicked: {}", shop_name, message);
                            self.stats.increment_error(ErrorType::ShopFailure);
                            vec![RunResult::start(RunKind::Basic, &shop_name)
                                .fail(format!("pipeline panicked: {}", message))]
                        }
                    }
                }
                Err(e) => {
                    log::error!("[{}] Invalid shop profile: {}", shop_name, e);
                    self.stats.increment_error(ErrorType::ShopFailure);
                    vec![RunResult::start(RunKind::Basic, &shop_name).fail(e.to_string())]
                }
            };

            for result in &shop_results {
                log_result(result);
                if let Err(e) = self.gateway.record_run(result).await {
                    log::warn!("[{}] Run not recorded: {}", result.shop_name, e);
                }
            }
            results.extend(shop_results);
        }

        results
    }

    /// Runs one shop: the basic phase for its mode, then the detail phase
    /// when the profile declares detail selectors. The detail phase covers the
    /// listings saved now and those earlier runs left `BasicParsed`.
    pub async fn run_shop(&self, parser: &ShopParser) -> Vec<RunResult> {
        let basic = Retry::start(get_retry_strategy(self.options.shop_retries), || async move {
            let result = self.run_basic_phase(parser).await;
            if result.success {
                Ok(result)
            } else {
                log::warn!(
                    "[{}] Basic phase failed: {}",
                    parser.name(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
                Err(result)
            }
        })
        .await
        .unwrap_or_else(|failed| failed);

        if !basic.success {
            self.stats.increment_error(ErrorType::ShopFailure);
        }

        let wants_details = basic.success
            && !self.options.skip_details
            && parser.mode() == ParseMode::TwoPhase
            && parser.has_detail_selectors();
        if !wants_details {
            return vec![basic];
        }

        let pending = self.pending_details(parser, &basic).await;
        if pending.is_empty() {
            return vec![basic];
        }
        let (detailed, _) = self.run_detail_phase(parser, pending).await;
        vec![basic, detailed]
    }

    /// Listings saved by `basic`, followed by the shop's stored listings still
    /// waiting for details. Each product URL appears once.
    async fn pending_details(&self, parser: &ShopParser, basic: &RunResult) -> Vec<Listing> {
        let mut pending = basic.saved_products.clone();
        let mut seen: HashSet<String> = pending.iter().map(|l| l.product_url.clone()).collect();

        let stored = async {
            let shop = self.open_shop(parser).await?;
            self.gateway
                .unresolved_listings(&shop)
                .await
                .context("cannot load listings waiting for details")
        }
        .await;

        match stored {
            Ok(stored) => {
                let before = pending.len();
                pending.extend(
                    stored
                        .into_iter()
                        .filter(|listing| seen.insert(listing.product_url.clone())),
                );
                if pending.len() > before {
                    log::info!(
                        "[{}] {} listings from earlier runs still need details",
                        parser.name(),
                        pending.len() - before
                    );
                }
            }
            Err(e) => log::warn!(
                "[{}] Details limited to this run's listings: {:#}",
                parser.name(),
                e
            ),
        }
        pending
    }

    async fn run_basic_phase(&self, parser: &ShopParser) -> RunResult {
        match (parser.mode(), self.options.save_mode) {
            (ParseMode::LegacySinglePhase, _) => self.run_legacy(parser).await,
            (ParseMode::TwoPhase, SaveMode::Streaming) => {
                self.parse_and_save_basic_products_stream(parser).await
            }
            (ParseMode::TwoPhase, SaveMode::Batch) => {
                self.parse_and_save_basic_products(parser).await
            }
        }
    }

    async fn open_shop(&self, parser: &ShopParser) -> anyhow::Result<Shop> {
        self.gateway
            .ensure_shop_exists(parser.name(), parser.shop_url())
            .await
            .with_context(|| format!("cannot register shop '{}'", parser.name()))
    }

    /// Basic phase with streaming saves: every new listing is saved in its own
    /// transaction as soon as it is extracted.
    ///
    /// A rejected save is counted in `failed` with its message and the next
    /// listing is still attempted; earlier saves stay committed.
    pub async fn parse_and_save_basic_products_stream(&self, parser: &ShopParser) -> RunResult {
        let mut result = RunResult::start(RunKind::Streaming, parser.name());

        let shop = match self.open_shop(parser).await {
            Ok(shop) => shop,
            Err(e) => return result.fail(format!("{:#}", e)),
        };
        let mut index = match self
            .gateway
            .known_product_urls(&shop)
            .await
            .context("cannot load known product URLs")
        {
            Ok(urls) => DedupIndex::by_url(urls),
            Err(e) => return result.fail(format!("{:#}", e)),
        };
        log::debug!("[{}] {} known product URLs", shop.name, index.len());

        for target in parser.targets() {
            let mut paginator = parser.paginator(target, shop.id);
            while let Some(page) = paginator.next_page().await {
                for mut listing in page.listings {
                    result.counts.parsed += 1;
                    if !index.accept(&listing) {
                        result.counts.skipped += 1;
                        continue;
                    }

                    self.store_image(&shop.name, &mut listing).await;
                    match self.gateway.save_one(&listing).await {
                        Ok(id) => {
                            listing.id = Some(id);
                            result.counts.saved += 1;
                            log::debug!("[{}] Saved {}", shop.name, listing.identity());
                            result.saved_products.push(listing);
                        }
                        Err(e) => {
                            result.counts.failed += 1;
                            self.stats.increment_error(ErrorType::ListingSaveFailure);
                            log::warn!(
                                "[{}] Failed to save {}: {}",
                                shop.name,
                                listing.identity(),
                                e
                            );
                            result.record_error(format!("{}: {}", listing.identity(), e));
                        }
                    }
                }
            }
        }

        result.finish()
    }

    /// Basic phase with one batch save after all pages are parsed.
    pub async fn parse_and_save_basic_products(&self, parser: &ShopParser) -> RunResult {
        let mut result = RunResult::start(RunKind::Basic, parser.name());

        let shop = match self.open_shop(parser).await {
            Ok(shop) => shop,
            Err(e) => return result.fail(format!("{:#}", e)),
        };
        let mut index = match self.gateway.known_product_urls(&shop).await {
            Ok(urls) => DedupIndex::by_url(urls),
            Err(e) => return result.fail(format!("cannot load known product URLs: {}", e)),
        };

        let listings = parser.parse_basic_products(shop.id).await;
        result.counts.parsed = listings.len();
        let (fresh, skipped) = index.filter_new(listings);
        result.counts.skipped = skipped;

        self.save_batch(&shop, fresh, result).await
    }

    /// Deprecated single-phase run: name + normalized price dedup, batch save,
    /// no detail phase.
    pub async fn run_legacy(&self, parser: &ShopParser) -> RunResult {
        log::warn!(
            "[{}] Using the deprecated single-phase parse mode",
            parser.name()
        );
        let mut result = RunResult::start(RunKind::Legacy, parser.name());

        let shop = match self.open_shop(parser).await {
            Ok(shop) => shop,
            Err(e) => return result.fail(format!("{:#}", e)),
        };
        let mut index = match self.gateway.known_name_price_pairs(&shop).await {
            Ok(pairs) => DedupIndex::by_name_price(pairs),
            Err(e) => return result.fail(format!("cannot load known products: {}", e)),
        };

        let listings = parser.parse_products(shop.id).await;
        result.counts.parsed = listings.len();
        let (fresh, skipped) = index.filter_new(listings);
        result.counts.skipped = skipped;

        self.save_batch(&shop, fresh, result).await
    }

    async fn save_batch(
        &self,
        shop: &Shop,
        mut fresh: Vec<Listing>,
        mut result: RunResult,
    ) -> RunResult {
        for listing in &mut fresh {
            self.store_image(&shop.name, listing).await;
        }
        if fresh.is_empty() {
            return result.finish();
        }

        let total = fresh.len();
        match self.gateway.save_many(&fresh).await {
            Ok(ids) => {
                let saved: Vec<Listing> = fresh
                    .into_iter()
                    .zip(ids)
                    .filter_map(|(mut listing, id)| {
                        listing.id = Some(id?);
                        Some(listing)
                    })
                    .collect();
                result.counts.saved = saved.len();
                result.counts.skipped += total - saved.len();
                result.saved_products = saved;
                result.finish()
            }
            Err(e) => {
                result.counts.failed = total;
                self.stats.increment_error(ErrorType::ListingSaveFailure);
                result.fail(format!("batch save of {} listings failed: {}", total, e))
            }
        }
    }

    /// Detail phase over `listings`.
    ///
    /// Returns the phase result and every listing, enriched where the product
    /// page could be parsed and unchanged otherwise.
    pub async fn run_detail_phase(
        &self,
        parser: &ShopParser,
        listings: Vec<Listing>,
    ) -> (RunResult, Vec<Listing>) {
        let mut result = RunResult::start(RunKind::Detailed, parser.name());
        let mut processed = Vec::with_capacity(listings.len());

        for listing in listings {
            result.counts.parsed += 1;
            let listing = parser.parse_detailed_product(listing).await;
            if listing.parsing_status == ParsingStatus::DetailedParsed {
                result.counts.detailed += 1;
                match self.gateway.update_listing(&listing).await {
                    Ok(()) => result.counts.saved += 1,
                    Err(e) => {
                        result.counts.failed += 1;
                        self.stats.increment_error(ErrorType::DetailUpdateFailure);
                        log::warn!(
                            "[{}] Failed to store details of {}: {}",
                            parser.name(),
                            listing.identity(),
                            e
                        );
                        result.record_error(format!("{}: {}", listing.identity(), e));
                    }
                }
            } else {
                result.counts.skipped += 1;
            }
            processed.push(listing);
        }

        (result.finish(), processed)
    }

    async fn store_image(&self, shop_name: &str, listing: &mut Listing) {
        let (Some(store), Some(url)) = (&self.images, &listing.image_url) else {
            return;
        };
        match store.fetch_and_store(url, shop_name).await {
            Some(path) => listing.image_path = Some(path),
            None => self.stats.increment_error(ErrorType::ImageFetchFailure),
        }
    }
}

fn log_result(result: &RunResult) {
    if result.success {
        log::info!(
            "[{}] {} finished: parsed={} saved={} skipped={} failed={} detailed={} in {:.1}s",
            result.shop_name,
            result.kind,
            result.counts.parsed,
            result.counts.saved,
            result.counts.skipped,
            result.counts.failed,
            result.counts.detailed,
            result.elapsed_seconds()
        );
    } else {
        log::error!(
            "[{}] {} failed: {}",
            result.shop_name,
            result.kind,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
