//! Resolves dish names into nutrition facts.
//!
//! Lookup order is the in-process cache, then the persistent cache store, then the external
//! food database (see [`resolver`]), and finally [`NutritionFacts::fallback`]. Successful
//! external resolutions are written through to both caches before being returned.

pub mod resolver;
pub mod score;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;

use crate::FoodDatabase;
use crate::models::nutrition::{NUTRITION_TTL_HOURS, NutritionFacts, NutritionRecord};
use crate::store::CacheStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysis {
    pub food_name: String,
    pub dining_hall: String,
    pub nutrition: NutritionFacts,
    pub health_score: f64,
    pub analyzed: DateTime<Utc>,
}

pub struct NutritionService {
    database: Arc<dyn FoodDatabase>,
    store: Arc<dyn CacheStore>,
    memory: Cache<String, NutritionFacts>,
}

impl NutritionService {
    pub fn new(
        database: Arc<dyn FoodDatabase>,
        store: Arc<dyn CacheStore>,
        memory_capacity: u64,
    ) -> Self {
        let ttl = Duration::from_secs(NUTRITION_TTL_HOURS as u64 * 60 * 60);
        let memory = Cache::builder()
            .max_capacity(memory_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            database,
            store,
            memory,
        }
    }

    fn cache_key(food_name: &str, dining_hall: &str) -> String {
        format!("{food_name}|{dining_hall}")
    }

    /// Always resolves, falling back to the default vector when nothing matches.
    #[tracing::instrument(skip(self))]
    pub async fn get_nutrition_data(&self, food_name: &str, dining_hall: &str) -> NutritionFacts {
        if food_name.trim().is_empty() {
            tracing::debug!("no food name provided, using defaults");
            return NutritionFacts::fallback();
        }

        if let Some(facts) = self.lookup_cached(food_name, dining_hall).await {
            return facts;
        }

        self.resolve_uncached(food_name, dining_hall).await
    }

    /// Resolves many dishes of one dining hall. Cached names are answered first, the rest go
    /// straight to the external lookup one by one.
    #[tracing::instrument(skip(self, food_names), fields(count = food_names.len()))]
    pub async fn get_nutrition_data_batch(
        &self,
        food_names: &[String],
        dining_hall: &str,
    ) -> HashMap<String, NutritionFacts> {
        let mut results = HashMap::with_capacity(food_names.len());
        let mut uncached = Vec::new();

        for food_name in food_names {
            if results.contains_key(food_name) || uncached.contains(&food_name) {
                continue;
            }

            if food_name.trim().is_empty() {
                results.insert(food_name.clone(), NutritionFacts::fallback());
                continue;
            }

            match self.lookup_cached(food_name, dining_hall).await {
                Some(facts) => {
                    results.insert(food_name.clone(), facts);
                }
                None => uncached.push(food_name),
            }
        }

        tracing::debug!(
            cached = results.len(),
            uncached = uncached.len(),
            "partitioned batch"
        );

        for food_name in uncached {
            let facts = self.resolve_uncached(food_name, dining_hall).await;
            results.insert(food_name.clone(), facts);
        }

        results
    }

    pub async fn analyze_meal(&self, food_name: &str, dining_hall: &str) -> MealAnalysis {
        let nutrition = self.get_nutrition_data(food_name, dining_hall).await;
        let health_score = score::calculate_health_score(&nutrition);

        MealAnalysis {
            food_name: food_name.to_owned(),
            dining_hall: dining_hall.to_owned(),
            nutrition,
            health_score,
            analyzed: Utc::now(),
        }
    }

    async fn lookup_cached(&self, food_name: &str, dining_hall: &str) -> Option<NutritionFacts> {
        let key = Self::cache_key(food_name, dining_hall);

        if let Some(facts) = self.memory.get(&key).await {
            tracing::debug!(%food_name, %dining_hall, "memory cache hit");
            return Some(facts);
        }

        match self.store.find_nutrition(food_name, dining_hall).await {
            Ok(Some(record)) if !record.is_expired(Utc::now()) => {
                tracing::debug!(%food_name, %dining_hall, "persistent cache hit");
                self.memory.insert(key, record.nutrition.clone()).await;
                Some(record.nutrition)
            }
            Ok(Some(_)) => {
                tracing::debug!(%food_name, %dining_hall, "persistent cache entry expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(%food_name, %dining_hall, error = ?e, "cache store lookup failed");
                None
            }
        }
    }

    async fn resolve_uncached(&self, food_name: &str, dining_hall: &str) -> NutritionFacts {
        let Some((strategy, facts)) = resolver::resolve(self.database.as_ref(), food_name).await
        else {
            tracing::info!(%food_name, %dining_hall, "using default nutrition");
            return NutritionFacts::fallback();
        };

        tracing::info!(%food_name, %dining_hall, %strategy, "resolved nutrition");

        self.memory
            .insert(Self::cache_key(food_name, dining_hall), facts.clone())
            .await;

        let record = NutritionRecord::new(food_name, dining_hall, facts.clone(), Utc::now());
        if let Err(e) = self.store.upsert_nutrition(&record).await {
            tracing::error!(%food_name, %dining_hall, error = ?e, "failed to cache nutrition");
        }

        facts
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::BoxFuture;
    use crate::models::menu_items::MenuItem;
    use crate::store::{InMemoryCacheStore, StoreResult};
    use crate::testing::StaticFoodDatabase;

    /// Counts persistent lookups on top of the in-memory store.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryCacheStore,
        finds: AtomicUsize,
    }

    impl CacheStore for CountingStore {
        fn clear_all(&self) -> BoxFuture<'_, StoreResult<()>> {
            self.inner.clear_all()
        }

        fn insert_menu_item<'a>(&'a self, item: &'a MenuItem) -> BoxFuture<'a, StoreResult<()>> {
            self.inner.insert_menu_item(item)
        }

        fn upsert_nutrition<'a>(
            &'a self,
            record: &'a NutritionRecord,
        ) -> BoxFuture<'a, StoreResult<()>> {
            self.inner.upsert_nutrition(record)
        }

        fn find_nutrition<'a>(
            &'a self,
            food_name: &'a str,
            dining_hall: &'a str,
        ) -> BoxFuture<'a, StoreResult<Option<NutritionRecord>>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            self.inner.find_nutrition(food_name, dining_hall)
        }

        fn list_menu_items(&self) -> BoxFuture<'_, StoreResult<Vec<MenuItem>>> {
            self.inner.list_menu_items()
        }

        fn list_nutrition(&self) -> BoxFuture<'_, StoreResult<Vec<NutritionRecord>>> {
            self.inner.list_nutrition()
        }
    }

    fn pizza_facts() -> NutritionFacts {
        NutritionFacts {
            calories: Some(276.0),
            protein: Some(12.3),
            ..NutritionFacts::fallback()
        }
    }

    fn service(
        database: StaticFoodDatabase,
    ) -> (NutritionService, Arc<StaticFoodDatabase>, Arc<InMemoryCacheStore>) {
        let database = Arc::new(database);
        let store = Arc::new(InMemoryCacheStore::new());
        let service = NutritionService::new(database.clone(), store.clone(), 100);
        (service, database, store)
    }

    #[tokio::test]
    async fn unknown_dish_gets_exact_default_vector() {
        let (service, _, store) = service(StaticFoodDatabase::new());

        let facts = service
            .get_nutrition_data("Unknown Mystery Dish 42", "Ferris")
            .await;

        assert_eq!(facts, NutritionFacts::fallback());
        assert_eq!(facts.calories, Some(250.0));
        assert_eq!(facts.protein, Some(8.0));
        // defaults are not written through
        assert!(store.list_nutrition().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn external_match_is_written_through_to_both_caches() {
        let (service, database, store) =
            service(StaticFoodDatabase::new().with("cheese pizza", pizza_facts()));

        let first = service.get_nutrition_data("Cheese Pizza", "JJ's").await;
        let second = service.get_nutrition_data("Cheese Pizza", "JJ's").await;

        assert_eq!(first, pizza_facts());
        assert_eq!(second, first);
        assert_eq!(database.queries(), ["cheese pizza"]);

        let persisted = store
            .find_nutrition("Cheese Pizza", "JJ's")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(persisted.nutrition, pizza_facts());
    }

    #[tokio::test]
    async fn persistent_cache_is_consulted_before_the_database() {
        let (service, database, store) = service(StaticFoodDatabase::new());
        let record = NutritionRecord::new("Lentil Soup", "Ferris", pizza_facts(), Utc::now());
        store.upsert_nutrition(&record).await.unwrap();

        let facts = service.get_nutrition_data("Lentil Soup", "Ferris").await;

        assert_eq!(facts, pizza_facts());
        assert!(database.queries().is_empty());
    }

    #[tokio::test]
    async fn expired_persistent_rows_are_resolved_again() {
        let (service, database, store) =
            service(StaticFoodDatabase::new().with("lentil soup", pizza_facts()));
        let stale = NutritionRecord::new(
            "Lentil Soup",
            "Ferris",
            NutritionFacts::fallback(),
            Utc::now() - chrono::Duration::hours(48),
        );
        store.upsert_nutrition(&stale).await.unwrap();

        let facts = service.get_nutrition_data("Lentil Soup", "Ferris").await;

        assert_eq!(facts, pizza_facts());
        assert_eq!(database.queries(), ["lentil soup"]);
    }

    #[tokio::test]
    async fn cache_is_keyed_by_dining_hall() {
        let (service, database, _) =
            service(StaticFoodDatabase::new().with("cheese pizza", pizza_facts()));

        service.get_nutrition_data("Cheese Pizza", "JJ's").await;
        service.get_nutrition_data("Cheese Pizza", "Ferris").await;

        assert_eq!(database.queries(), ["cheese pizza", "cheese pizza"]);
    }

    #[tokio::test]
    async fn batch_only_looks_up_uncached_names_once() {
        let (service, database, store) =
            service(StaticFoodDatabase::new().with("cheese pizza", pizza_facts()));
        let cached = NutritionRecord::new("Salad Bar", "JJ's", pizza_facts(), Utc::now());
        store.upsert_nutrition(&cached).await.unwrap();

        let names = [
            String::from("Salad Bar"),
            String::from("Cheese Pizza"),
            String::from("Cheese Pizza"),
            String::from("Mystery Stew"),
        ];
        let results = service.get_nutrition_data_batch(&names, "JJ's").await;

        assert_eq!(results.len(), 3);
        assert_eq!(results["Cheese Pizza"], pizza_facts());
        assert_eq!(results["Mystery Stew"], NutritionFacts::fallback());
        assert_eq!(
            database.queries(),
            ["cheese pizza", "mystery stew", "mystery"]
        );
    }

    #[tokio::test]
    async fn analysis_scores_the_resolved_facts() {
        let (service, _, _) = service(StaticFoodDatabase::new());

        let analysis = service.analyze_meal("Unknown Mystery Dish 42", "Ferris").await;

        assert_eq!(analysis.nutrition, NutritionFacts::fallback());
        assert_eq!(
            analysis.health_score,
            score::calculate_health_score(&NutritionFacts::fallback())
        );
    }

    #[tokio::test]
    async fn batch_checks_each_cache_once_per_name() {
        let database = Arc::new(StaticFoodDatabase::new().with("cheese pizza", pizza_facts()));
        let store = Arc::new(CountingStore::default());
        let cached = NutritionRecord::new("Salad Bar", "JJ's", pizza_facts(), Utc::now());
        store.upsert_nutrition(&cached).await.unwrap();
        let service = NutritionService::new(database, store.clone(), 100);

        let names = [
            String::from("Salad Bar"),
            String::from("Cheese Pizza"),
            String::from("Cheese Pizza"),
            String::from("Mystery Stew"),
            String::from(" "),
        ];
        let results = service.get_nutrition_data_batch(&names, "JJ's").await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[" "], NutritionFacts::fallback());
        assert_eq!(store.finds.load(Ordering::SeqCst), 3);
    }
}
