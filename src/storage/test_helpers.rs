//! Shared test helpers for storage module tests.

use sqlx::SqlitePool;

use crate::models::Listing;
use crate::storage::run_migrations;

/// Creates an in-memory test database pool with migrations applied.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A basic-phase listing for `shop_id`.
pub fn test_listing(shop_id: i64, name: &str, url: &str) -> Listing {
    Listing::basic(name, url, shop_id)
}
