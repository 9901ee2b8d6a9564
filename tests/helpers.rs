// Shared test helpers: database setup, catalog fixtures and a scriptable gateway.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::SqlitePool;
use wiremock::ResponseTemplate;

use catalog_scraper::storage::run_migrations;
use catalog_scraper::{
    CatalogUrlConfig, Listing, PageFetcher, PaginationRule, ParseMode, PersistenceError,
    PersistenceGateway, PipelineOptions, PipelineOrchestrator, ProcessingStats, SaveMode,
    SelectorSet, Shop, ShopProfile,
};

/// Creates an in-memory test database pool with migrations applied.
#[allow(dead_code)]
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Catalog page with one `.item` per id, linking to `/p/<id>`.
#[allow(dead_code)]
pub fn catalog_page(ids: &[u32]) -> String {
    let mut body = String::from("<html><body><div class=\"catalog\">");
    for id in ids {
        body.push_str(&format!(
            r#"<div class="item"><a class="link" href="/p/{id}"><span class="title">Item {id}</span></a><span class="price">{id}00 ₽</span></div>"#
        ));
    }
    body.push_str("</div></body></html>");
    body
}

/// Product page with a material and two sizes.
#[allow(dead_code)]
pub fn product_page(material: &str) -> String {
    format!(
        r#"<html><body>
            <div class="description"><p>Made to order.</p></div>
            <span class="material">{material}</span>
            <ul class="sizes"><li>S</li><li>M</li></ul>
        </body></html>"#
    )
}

#[allow(dead_code)]
pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

/// Selectors matching `catalog_page` and `product_page`.
#[allow(dead_code)]
pub fn selectors() -> SelectorSet {
    serde_json::from_value(serde_json::json!({
        "product_container": ".catalog .item",
        "name": ".title",
        "product_link": "a.link",
        "price": ".price",
        "detail": {
            "description": ".description p",
            "material": ".material",
            "variants": [{"axis": "size", "selector": ".sizes li"}]
        }
    }))
    .expect("valid selector set")
}

#[allow(dead_code)]
pub fn profile(name: &str, base_url: String, pagination: Option<PaginationRule>) -> ShopProfile {
    ShopProfile {
        name: name.to_string(),
        shop_url: None,
        base_urls: vec![CatalogUrlConfig::new(base_url, pagination)],
        selectors: selectors(),
        mode: ParseMode::TwoPhase,
        max_pages: None,
    }
}

#[allow(dead_code)]
pub fn page_template() -> Option<PaginationRule> {
    Some(PaginationRule::Template {
        template: "?page={page}".to_string(),
    })
}

#[allow(dead_code)]
pub fn options(save_mode: SaveMode, skip_details: bool) -> PipelineOptions {
    PipelineOptions {
        save_mode,
        skip_details,
        shop_retries: 0,
        max_pages: 100,
    }
}

#[allow(dead_code)]
pub fn orchestrator(
    gateway: Arc<dyn PersistenceGateway>,
    options: PipelineOptions,
) -> PipelineOrchestrator {
    PipelineOrchestrator::new(
        gateway,
        PageFetcher::new(reqwest::Client::new()),
        Arc::new(ProcessingStats::new()),
        options,
    )
}

/// In-memory gateway that rejects saves of chosen product URLs and can be
/// told to panic or to fail shop registration.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedGateway {
    pub saved: Mutex<Vec<Listing>>,
    pub updated: Mutex<Vec<Listing>>,
    pub reject_urls: HashSet<String>,
    pub panic_on_shop: Option<String>,
    pub fail_shop_lookups: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedGateway {
    pub fn rejecting(urls: &[String]) -> Self {
        Self {
            reject_urls: urls.iter().cloned().collect(),
            ..Default::default()
        }
    }

    pub fn saved_urls(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.product_url.clone())
            .collect()
    }
}

#[async_trait]
impl PersistenceGateway for ScriptedGateway {
    async fn ensure_shop_exists(
        &self,
        name: &str,
        url: Option<&str>,
    ) -> Result<Shop, PersistenceError> {
        if self.panic_on_shop.as_deref() == Some(name) {
            panic!("gateway exploded for {}", name);
        }
        if self.fail_shop_lookups.load(Ordering::SeqCst) > 0 {
            self.fail_shop_lookups.fetch_sub(1, Ordering::SeqCst);
            return Err(PersistenceError::Rejected("store unavailable".into()));
        }
        Ok(Shop {
            id: 1,
            name: name.to_string(),
            url: url.map(str::to_string),
        })
    }

    async fn known_product_urls(&self, _shop: &Shop) -> Result<HashSet<String>, PersistenceError> {
        Ok(self.saved_urls().into_iter().collect())
    }

    async fn known_name_price_pairs(
        &self,
        _shop: &Shop,
    ) -> Result<Vec<(String, Option<String>)>, PersistenceError> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .map(|l| (l.name.clone(), l.price.clone()))
            .collect())
    }

    async fn save_one(&self, listing: &Listing) -> Result<i64, PersistenceError> {
        if self.reject_urls.contains(&listing.product_url) {
            return Err(PersistenceError::Rejected(format!(
                "constraint violated for {}",
                listing.product_url
            )));
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(listing.clone());
        Ok(saved.len() as i64)
    }

    async fn unresolved_listings(&self, _shop: &Shop) -> Result<Vec<Listing>, PersistenceError> {
        let updated: HashSet<String> = self
            .updated
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.product_url.clone())
            .collect();
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .filter(|l| !updated.contains(&l.product_url))
            .cloned()
            .collect())
    }

    async fn save_many(&self, listings: &[Listing]) -> Result<Vec<Option<i64>>, PersistenceError> {
        let mut saved = self.saved.lock().unwrap();
        let mut ids = Vec::with_capacity(listings.len());
        for listing in listings {
            let conflict = self.reject_urls.contains(&listing.product_url)
                || saved.iter().any(|l| l.product_url == listing.product_url);
            if conflict {
                ids.push(None);
            } else {
                saved.push(listing.clone());
                ids.push(Some(saved.len() as i64));
            }
        }
        Ok(ids)
    }

    async fn update_listing(&self, listing: &Listing) -> Result<(), PersistenceError> {
        self.updated.lock().unwrap().push(listing.clone());
        Ok(())
    }
}
