//! Persistent cache for scraped menus and resolved nutrition.
//!
//! The refresh job clears both tables and repopulates them, so readers can briefly observe an
//! empty or partially filled cache while a run is in flight. Callers must treat empty results
//! as "no data yet" rather than as an error.

mod memory;
mod postgres;

pub use memory::InMemoryCacheStore;
pub use postgres::PgCacheStore;
use thiserror::Error;

use crate::BoxFuture;
use crate::models::menu_items::MenuItem;
use crate::models::nutrition::NutritionRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid cached row: {0}")]
    InvalidRow(String),

    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait CacheStore: Send + Sync {
    /// Deletes every menu and nutrition row.
    fn clear_all(&self) -> BoxFuture<'_, StoreResult<()>>;

    /// Stores a menu item. Duplicate natural keys keep the first row.
    fn insert_menu_item<'a>(&'a self, item: &'a MenuItem) -> BoxFuture<'a, StoreResult<()>>;

    /// Inserts or replaces the single record kept per `(food_name, dining_hall)`.
    fn upsert_nutrition<'a>(&'a self, record: &'a NutritionRecord)
    -> BoxFuture<'a, StoreResult<()>>;

    fn find_nutrition<'a>(
        &'a self,
        food_name: &'a str,
        dining_hall: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<NutritionRecord>>>;

    fn list_menu_items(&self) -> BoxFuture<'_, StoreResult<Vec<MenuItem>>>;

    fn list_nutrition(&self) -> BoxFuture<'_, StoreResult<Vec<NutritionRecord>>>;
}
