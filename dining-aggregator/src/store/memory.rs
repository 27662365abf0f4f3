use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use super::{CacheStore, StoreResult};
use crate::BoxFuture;
use crate::models::menu_items::{MealPeriod, MenuItem};
use crate::models::nutrition::NutritionRecord;

type MenuKey = (String, MealPeriod, String);
type NutritionKey = (String, String);

#[derive(Debug, Default)]
struct Tables {
    menu: Vec<MenuItem>,
    menu_keys: HashMap<MenuKey, usize>,
    nutrition: Vec<NutritionRecord>,
    nutrition_keys: HashMap<NutritionKey, usize>,
}

/// Process-local cache store with the same key semantics as the Postgres tables.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    tables: RwLock<Tables>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn clear_all(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            *self.tables.write().await = Tables::default();
            Ok(())
        })
    }

    fn insert_menu_item<'a>(&'a self, item: &'a MenuItem) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let key = (
                item.dining_hall.clone(),
                item.meal_period,
                item.food_name.clone(),
            );

            if tables.menu_keys.contains_key(&key) {
                return Ok(());
            }

            let mut item = item.clone();
            item.last_updated.get_or_insert_with(Utc::now);

            let index = tables.menu.len();
            tables.menu.push(item);
            tables.menu_keys.insert(key, index);

            Ok(())
        })
    }

    fn upsert_nutrition<'a>(
        &'a self,
        record: &'a NutritionRecord,
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let key = (record.food_name.clone(), record.dining_hall.clone());

            match tables.nutrition_keys.get(&key).copied() {
                Some(index) => tables.nutrition[index] = record.clone(),
                None => {
                    let index = tables.nutrition.len();
                    tables.nutrition.push(record.clone());
                    tables.nutrition_keys.insert(key, index);
                }
            }

            Ok(())
        })
    }

    fn find_nutrition<'a>(
        &'a self,
        food_name: &'a str,
        dining_hall: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<NutritionRecord>>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            let key = (food_name.to_owned(), dining_hall.to_owned());

            Ok(tables
                .nutrition_keys
                .get(&key)
                .map(|index| tables.nutrition[*index].clone()))
        })
    }

    fn list_menu_items(&self) -> BoxFuture<'_, StoreResult<Vec<MenuItem>>> {
        Box::pin(async move { Ok(self.tables.read().await.menu.clone()) })
    }

    fn list_nutrition(&self) -> BoxFuture<'_, StoreResult<Vec<NutritionRecord>>> {
        Box::pin(async move { Ok(self.tables.read().await.nutrition.clone()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::nutrition::NutritionFacts;

    #[tokio::test]
    async fn nutrition_round_trips_unchanged() {
        let store = InMemoryCacheStore::new();
        let facts = NutritionFacts {
            calories: Some(412.37),
            protein: Some(0.1 + 0.2),
            fiber: None,
            ..NutritionFacts::fallback()
        };
        let record = NutritionRecord::new("Pizza", "JJ's", facts.clone(), Utc::now());

        store.upsert_nutrition(&record).await.unwrap();
        let found = store.find_nutrition("Pizza", "JJ's").await.unwrap().unwrap();

        assert_eq!(found, record);
        assert_eq!(found.nutrition.protein.map(f64::to_bits), facts.protein.map(f64::to_bits));
        assert!(store.find_nutrition("Pizza", "Ferris").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn keeps_one_nutrition_record_per_key() {
        let store = InMemoryCacheStore::new();
        let now = Utc::now();

        let first = NutritionRecord::new("Soup", "Ferris", NutritionFacts::fallback(), now);
        let mut second = first.clone();
        second.nutrition.calories = Some(90.0);

        store.upsert_nutrition(&first).await.unwrap();
        store.upsert_nutrition(&second).await.unwrap();

        let all = store.list_nutrition().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].nutrition.calories, Some(90.0));
    }

    #[tokio::test]
    async fn duplicate_menu_keys_keep_first_row_and_clear_empties_everything() {
        let store = InMemoryCacheStore::new();
        let mut first = MenuItem::new(MealPeriod::Lunch, "JJ's", "11-3", "Grill", "Pizza");
        first.contains = vec![String::from("Gluten")];
        let second = MenuItem::new(MealPeriod::Lunch, "JJ's", "11-3", "Oven", "Pizza");

        store.insert_menu_item(&first).await.unwrap();
        store.insert_menu_item(&second).await.unwrap();
        store
            .upsert_nutrition(&NutritionRecord::new(
                "Pizza",
                "JJ's",
                NutritionFacts::fallback(),
                Utc::now(),
            ))
            .await
            .unwrap();

        let menu = store.list_menu_items().await.unwrap();
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].food_type, "Grill");
        assert!(menu[0].last_updated.is_some());

        store.clear_all().await.unwrap();
        assert!(store.list_menu_items().await.unwrap().is_empty());
        assert!(store.list_nutrition().await.unwrap().is_empty());
    }
}
