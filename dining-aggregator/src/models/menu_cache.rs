use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;

use crate::models::menu_items::MenuItem;

#[derive(Debug, FromRow)]
pub struct MenuCacheRow {
    pub id: i64,
    pub meal_type: String,
    pub dining_hall: String,
    pub hours: String,
    pub food_type: String,
    pub food_name: String,
    pub dietary_preferences: Vec<String>,
    pub contains: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CreateMenuCachePayload<'data> {
    pub meal_type: String,
    pub dining_hall: &'data str,
    pub hours: &'data str,
    pub food_type: &'data str,
    pub food_name: &'data str,
    pub dietary_preferences: &'data [String],
    pub contains: &'data [String],
    pub last_updated: DateTime<Utc>,
}

impl<'data> From<&'data MenuItem> for CreateMenuCachePayload<'data> {
    fn from(item: &'data MenuItem) -> Self {
        Self {
            meal_type: item.meal_period.to_string(),
            dining_hall: &item.dining_hall,
            hours: &item.hours,
            food_type: &item.food_type,
            food_name: &item.food_name,
            dietary_preferences: &item.dietary_preferences,
            contains: &item.contains,
            last_updated: item.last_updated.unwrap_or_else(Utc::now),
        }
    }
}

impl TryFrom<MenuCacheRow> for MenuItem {
    type Error = String;

    fn try_from(row: MenuCacheRow) -> Result<Self, Self::Error> {
        Ok(MenuItem {
            meal_period: row.meal_type.parse()?,
            dining_hall: row.dining_hall,
            hours: row.hours,
            food_type: row.food_type,
            food_name: row.food_name,
            dietary_preferences: row.dietary_preferences,
            contains: row.contains,
            last_updated: Some(row.last_updated),
        })
    }
}

impl MenuCacheRow {
    /// Inserts one row. A second row for the same natural key is dropped, the first one wins.
    pub async fn insert(
        executor: &mut PgConnection,
        payload: CreateMenuCachePayload<'_>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO menu_cache
                (meal_type, dining_hall, hours, food_type, food_name, dietary_preferences, contains, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (dining_hall, meal_type, food_name) DO NOTHING;
            "#,
        )
        .bind(payload.meal_type)
        .bind(payload.dining_hall)
        .bind(payload.hours)
        .bind(payload.food_type)
        .bind(payload.food_name)
        .bind(payload.dietary_preferences)
        .bind(payload.contains)
        .bind(payload.last_updated)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn get_all(executor: &mut PgConnection) -> sqlx::Result<Vec<MenuCacheRow>> {
        sqlx::query_as::<_, MenuCacheRow>("SELECT * FROM menu_cache ORDER BY id;")
            .fetch_all(executor)
            .await
    }

    pub async fn delete_all(executor: &mut PgConnection) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM menu_cache;")
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
