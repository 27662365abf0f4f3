use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use sqlx::types::Json;

use crate::models::nutrition::{NutritionFacts, NutritionRecord};

#[derive(Debug, FromRow)]
pub struct NutritionCacheRow {
    pub id: i64,
    pub meal_name: String,
    pub dining_hall: String,
    pub nutrition_data: Json<NutritionFacts>,
    pub last_updated: DateTime<Utc>,
    pub next_refresh: DateTime<Utc>,
}

impl From<NutritionCacheRow> for NutritionRecord {
    fn from(row: NutritionCacheRow) -> Self {
        NutritionRecord {
            food_name: row.meal_name,
            dining_hall: row.dining_hall,
            nutrition: row.nutrition_data.0,
            last_updated: row.last_updated,
            next_refresh: row.next_refresh,
        }
    }
}

impl NutritionCacheRow {
    pub async fn create_or_update(
        executor: &mut PgConnection,
        record: &NutritionRecord,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO nutrition_cache (meal_name, dining_hall, nutrition_data, last_updated, next_refresh)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (meal_name, dining_hall) DO UPDATE SET
                nutrition_data = EXCLUDED.nutrition_data,
                last_updated = EXCLUDED.last_updated,
                next_refresh = EXCLUDED.next_refresh;
            "#,
        )
        .bind(&record.food_name)
        .bind(&record.dining_hall)
        .bind(Json(&record.nutrition))
        .bind(record.last_updated)
        .bind(record.next_refresh)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find(
        executor: &mut PgConnection,
        meal_name: &str,
        dining_hall: &str,
    ) -> sqlx::Result<Option<NutritionCacheRow>> {
        sqlx::query_as::<_, NutritionCacheRow>(
            r#"
            SELECT
                *
            FROM
                nutrition_cache
            WHERE
                meal_name = $1 AND dining_hall = $2;
            "#,
        )
        .bind(meal_name)
        .bind(dining_hall)
        .fetch_optional(executor)
        .await
    }

    pub async fn get_all(executor: &mut PgConnection) -> sqlx::Result<Vec<NutritionCacheRow>> {
        sqlx::query_as::<_, NutritionCacheRow>("SELECT * FROM nutrition_cache ORDER BY id;")
            .fetch_all(executor)
            .await
    }

    pub async fn delete_all(executor: &mut PgConnection) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM nutrition_cache;")
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
