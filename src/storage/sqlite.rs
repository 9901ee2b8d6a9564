//! SQLite implementation of `PersistenceGateway`.
//!
//! Listings go to `products`, with images and variants in the
//! `product_images` and `product_variants` child tables. Every write that
//! touches more than one table runs in a transaction.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::error_handling::PersistenceError;
use crate::models::{Listing, ParsingStatus, Shop};
use crate::pipeline::RunResult;

use super::gateway::PersistenceGateway;
use super::runs::insert_run_result;

fn millis(datetime: &DateTime<Utc>) -> i64 {
    datetime.timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

/// Gateway over a migrated SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert_listing(
        tx: &mut Transaction<'_, Sqlite>,
        listing: &Listing,
        ignore_conflicts: bool,
    ) -> Result<Option<i64>, PersistenceError> {
        let sql = if ignore_conflicts {
            "INSERT INTO products (
                shop_id, name, product_url, parsing_status, description, price, material,
                image_url, image_path, created_at_ms, updated_at_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(shop_id, product_url) DO NOTHING
            RETURNING id"
        } else {
            "INSERT INTO products (
                shop_id, name, product_url, parsing_status, description, price, material,
                image_url, image_path, created_at_ms, updated_at_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id"
        };

        let id = sqlx::query_scalar::<_, i64>(sql)
            .bind(listing.shop_id)
            .bind(&listing.name)
            .bind(&listing.product_url)
            .bind(listing.parsing_status.as_ref())
            .bind(&listing.description)
            .bind(&listing.price)
            .bind(&listing.material)
            .bind(&listing.image_url)
            .bind(&listing.image_path)
            .bind(millis(&listing.created_at))
            .bind(millis(&listing.updated_at))
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(id) = id {
            Self::replace_children(tx, id, listing).await?;
        }
        Ok(id)
    }

    async fn replace_children(
        tx: &mut Transaction<'_, Sqlite>,
        product_id: i64,
        listing: &Listing,
    ) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM product_images WHERE product_id = ?")
            .bind(product_id)
            .execute(&mut **tx)
            .await?;
        for (position, url) in listing.images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_images (product_id, position, url) VALUES (?, ?, ?)
                 ON CONFLICT(product_id, url) DO NOTHING",
            )
            .bind(product_id)
            .bind(position as i64)
            .bind(url)
            .execute(&mut **tx)
            .await?;
        }

        sqlx::query("DELETE FROM product_variants WHERE product_id = ?")
            .bind(product_id)
            .execute(&mut **tx)
            .await?;
        for variant in &listing.variants {
            sqlx::query(
                "INSERT INTO product_variants (product_id, axis, value) VALUES (?, ?, ?)
                 ON CONFLICT(product_id, axis, value) DO NOTHING",
            )
            .bind(product_id)
            .bind(&variant.axis)
            .bind(&variant.value)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn ensure_shop_exists(
        &self,
        name: &str,
        url: Option<&str>,
    ) -> Result<Shop, PersistenceError> {
        let row = sqlx::query(
            "INSERT INTO shops (name, url, created_at_ms) VALUES (?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET url = COALESCE(excluded.url, shops.url)
             RETURNING id, name, url",
        )
        .bind(name)
        .bind(url)
        .bind(Utc::now().timestamp_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(Shop {
            id: row.get("id"),
            name: row.get("name"),
            url: row.get("url"),
        })
    }

    async fn known_product_urls(&self, shop: &Shop) -> Result<HashSet<String>, PersistenceError> {
        let urls = sqlx::query_scalar::<_, String>(
            "SELECT product_url FROM products WHERE shop_id = ?",
        )
        .bind(shop.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(urls.into_iter().collect())
    }

    async fn known_name_price_pairs(
        &self,
        shop: &Shop,
    ) -> Result<Vec<(String, Option<String>)>, PersistenceError> {
        let rows = sqlx::query("SELECT name, price FROM products WHERE shop_id = ?")
            .bind(shop.id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| (row.get("name"), row.get("price")))
            .collect())
    }

    async fn save_one(&self, listing: &Listing) -> Result<i64, PersistenceError> {
        let mut tx = self.pool.begin().await?;
        match Self::insert_listing(&mut tx, listing, false).await {
            Ok(Some(id)) => {
                tx.commit().await?;
                Ok(id)
            }
            Ok(None) => {
                tx.rollback().await?;
                Err(PersistenceError::Rejected(format!(
                    "no row written for {}",
                    listing.identity()
                )))
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    log::warn!("Rollback failed for {}: {}", listing.identity(), rollback);
                }
                Err(e)
            }
        }
    }

    async fn unresolved_listings(&self, shop: &Shop) -> Result<Vec<Listing>, PersistenceError> {
        let rows = sqlx::query(
            "SELECT id, name, product_url, description, price, material, image_url, image_path,
                    created_at_ms, updated_at_ms
             FROM products
             WHERE shop_id = ? AND parsing_status = ?
             ORDER BY id",
        )
        .bind(shop.id)
        .bind(ParsingStatus::BasicParsed.as_ref())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Listing {
                id: Some(row.get("id")),
                name: row.get("name"),
                product_url: row.get("product_url"),
                shop_id: shop.id,
                parsing_status: ParsingStatus::BasicParsed,
                created_at: from_millis(row.get("created_at_ms")),
                updated_at: from_millis(row.get("updated_at_ms")),
                description: row.get("description"),
                price: row.get("price"),
                material: row.get("material"),
                image_url: row.get("image_url"),
                image_path: row.get("image_path"),
                images: Vec::new(),
                variants: Vec::new(),
            })
            .collect())
    }

    async fn save_many(&self, listings: &[Listing]) -> Result<Vec<Option<i64>>, PersistenceError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(listings.len());
        for listing in listings {
            ids.push(Self::insert_listing(&mut tx, listing, true).await?);
        }
        tx.commit().await?;
        Ok(ids)
    }

    async fn update_listing(&self, listing: &Listing) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query_scalar::<_, i64>(
            "UPDATE products
             SET parsing_status = ?, description = ?, price = ?, material = ?,
                 image_url = ?, image_path = ?, updated_at_ms = ?
             WHERE shop_id = ? AND product_url = ?
             RETURNING id",
        )
        .bind(listing.parsing_status.as_ref())
        .bind(&listing.description)
        .bind(&listing.price)
        .bind(&listing.material)
        .bind(&listing.image_url)
        .bind(&listing.image_path)
        .bind(millis(&listing.updated_at))
        .bind(listing.shop_id)
        .bind(&listing.product_url)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = id else {
            tx.rollback().await?;
            return Err(PersistenceError::Rejected(format!(
                "{} is not stored",
                listing.identity()
            )));
        };
        Self::replace_children(&mut tx, id, listing).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn record_run(&self, result: &RunResult) -> Result<(), PersistenceError> {
        insert_run_result(&self.pool, result).await
    }
}
