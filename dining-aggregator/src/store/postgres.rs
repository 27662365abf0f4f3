use sqlx::PgPool;

use super::{CacheStore, StoreError, StoreResult};
use crate::BoxFuture;
use crate::models::menu_cache::{CreateMenuCachePayload, MenuCacheRow};
use crate::models::menu_items::MenuItem;
use crate::models::nutrition::NutritionRecord;
use crate::models::nutrition_cache::NutritionCacheRow;

#[derive(Debug, Clone)]
pub struct PgCacheStore {
    pool: PgPool,
}

impl PgCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CacheStore for PgCacheStore {
    #[tracing::instrument(skip(self))]
    fn clear_all(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            let menu_rows = MenuCacheRow::delete_all(tx.as_mut()).await?;
            let nutrition_rows = NutritionCacheRow::delete_all(tx.as_mut()).await?;

            tx.commit().await?;
            tracing::info!(%menu_rows, %nutrition_rows, "cache tables cleared");

            Ok(())
        })
    }

    fn insert_menu_item<'a>(&'a self, item: &'a MenuItem) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            MenuCacheRow::insert(conn.as_mut(), CreateMenuCachePayload::from(item)).await?;
            Ok(())
        })
    }

    fn upsert_nutrition<'a>(
        &'a self,
        record: &'a NutritionRecord,
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            NutritionCacheRow::create_or_update(conn.as_mut(), record).await?;
            Ok(())
        })
    }

    fn find_nutrition<'a>(
        &'a self,
        food_name: &'a str,
        dining_hall: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<NutritionRecord>>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            let row = NutritionCacheRow::find(conn.as_mut(), food_name, dining_hall).await?;
            Ok(row.map(NutritionRecord::from))
        })
    }

    fn list_menu_items(&self) -> BoxFuture<'_, StoreResult<Vec<MenuItem>>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            let rows = MenuCacheRow::get_all(conn.as_mut()).await?;

            rows.into_iter()
                .map(|row| MenuItem::try_from(row).map_err(StoreError::InvalidRow))
                .collect()
        })
    }

    fn list_nutrition(&self) -> BoxFuture<'_, StoreResult<Vec<NutritionRecord>>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            let rows = NutritionCacheRow::get_all(conn.as_mut()).await?;
            Ok(rows.into_iter().map(NutritionRecord::from).collect())
        })
    }
}
