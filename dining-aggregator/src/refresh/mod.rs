//! Full cache refresh: scrape, clear, repopulate, enrich.
//!
//! A run never retries internally. A failed run leaves the service idle again and the next
//! scheduled run is the retry.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Local, TimeZone, Utc};
use derive_more::Display;
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::menu::MenuScraper;
use crate::models::menu_items::MenuItem;
use crate::models::nutrition::NutritionRecord;
use crate::nutrition::NutritionService;
use crate::store::CacheStore;

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    #[display("idle")]
    Idle,
    #[display("scraping")]
    Scraping,
    #[display("clearing")]
    Clearing,
    #[display("populating")]
    Populating,
    #[display("enriching")]
    Enriching,
    #[display("failed")]
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub menu_items: usize,
    pub skipped_menu_items: usize,
    pub nutrition_records: usize,
    pub skipped_nutrition_records: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Completed(RefreshSummary),
    /// Another run was in flight, nothing was done.
    Skipped { state: RefreshState },
    Failed { error: String },
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RefreshOutcome::Failed { .. })
    }
}

pub struct CacheRefreshService {
    scraper: Arc<MenuScraper>,
    store: Arc<dyn CacheStore>,
    nutrition: Arc<NutritionService>,
    run_lock: Mutex<()>,
    state: watch::Sender<RefreshState>,
}

impl CacheRefreshService {
    pub fn new(
        scraper: Arc<MenuScraper>,
        store: Arc<dyn CacheStore>,
        nutrition: Arc<NutritionService>,
    ) -> Self {
        let (state, _) = watch::channel(RefreshState::Idle);

        Self {
            scraper,
            store,
            nutrition,
            run_lock: Mutex::new(()),
            state,
        }
    }

    pub fn state(&self) -> RefreshState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.state.subscribe()
    }

    fn enter(&self, state: RefreshState) {
        tracing::debug!(%state, "refresh state changed");
        self.state.send_replace(state);
    }

    /// Runs one refresh unless another one is already in flight.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_cache(&self) -> RefreshOutcome {
        let Ok(_guard) = self.run_lock.try_lock() else {
            let state = self.state();
            tracing::info!(%state, "refresh already running, skipping");
            return RefreshOutcome::Skipped { state };
        };

        tracing::info!("starting cache refresh");
        match self.run().await {
            Ok(summary) => {
                self.enter(RefreshState::Idle);
                tracing::info!(
                    menu_items = summary.menu_items,
                    nutrition_records = summary.nutrition_records,
                    skipped = summary.skipped_menu_items + summary.skipped_nutrition_records,
                    "cache refresh completed"
                );
                RefreshOutcome::Completed(summary)
            }
            Err(e) => {
                self.enter(RefreshState::Failed);
                tracing::error!(error = ?e, "cache refresh failed");
                self.enter(RefreshState::Idle);
                RefreshOutcome::Failed {
                    error: format!("{e:#}"),
                }
            }
        }
    }

    async fn run(&self) -> anyhow::Result<RefreshSummary> {
        let started_at = Utc::now();

        self.enter(RefreshState::Scraping);
        let menu = self
            .scraper
            .scrape_menu_data()
            .await
            .into_result()
            .map_err(|e| anyhow::anyhow!("failed to fetch menu data: {e}"))?;

        // nothing has been touched before this point
        self.enter(RefreshState::Clearing);
        self.store
            .clear_all()
            .await
            .context("failed to clear cache tables")?;

        self.enter(RefreshState::Populating);
        let mut skipped_menu_items = 0;
        let mut stored: Vec<MenuItem> = Vec::with_capacity(menu.len());

        for item in menu.iter() {
            let mut item = item.clone();
            item.last_updated = Some(Utc::now());

            match self.store.insert_menu_item(&item).await {
                Ok(()) => stored.push(item),
                Err(e) => {
                    tracing::error!(
                        food_name = %item.food_name,
                        dining_hall = %item.dining_hall,
                        error = ?e,
                        "failed to insert menu item"
                    );
                    skipped_menu_items += 1;
                }
            }
        }

        self.enter(RefreshState::Enriching);
        let (nutrition_records, skipped_nutrition_records) = self.enrich(&stored).await;

        Ok(RefreshSummary {
            menu_items: stored.len(),
            skipped_menu_items,
            nutrition_records,
            skipped_nutrition_records,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn enrich(&self, items: &[MenuItem]) -> (usize, usize) {
        let mut seen = HashSet::new();
        let mut written = 0;
        let mut skipped = 0;

        for item in items.iter().filter(|item| !item.is_sentinel()) {
            if !seen.insert((item.food_name.as_str(), item.dining_hall.as_str())) {
                continue;
            }

            let facts = self
                .nutrition
                .get_nutrition_data(&item.food_name, &item.dining_hall)
                .await;
            let record = NutritionRecord::new(
                item.food_name.as_str(),
                item.dining_hall.as_str(),
                facts,
                Utc::now(),
            );

            match self.store.upsert_nutrition(&record).await {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::error!(
                        food_name = %item.food_name,
                        dining_hall = %item.dining_hall,
                        error = ?e,
                        "failed to insert nutrition"
                    );
                    skipped += 1;
                }
            }
        }

        (written, skipped)
    }

    /// Runs a refresh every day at `hour` local time.
    pub fn spawn_daily(self: Arc<Self>, hour: u32) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let wait = duration_until_next(&Local::now(), hour);
                tracing::info!(hour, wait_secs = wait.as_secs(), "next cache refresh scheduled");
                tokio::time::sleep(wait).await;

                if let RefreshOutcome::Failed { error } = self.refresh_cache().await {
                    tracing::warn!(%error, "scheduled refresh failed, retrying tomorrow");
                }
            }
        })
    }
}

/// Time from `now` until the next `hour:00` in `now`'s timezone, strictly in the future.
pub fn duration_until_next<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> Duration {
    let timezone = now.timezone();
    let mut date = now.date_naive();

    // a missing local hour (DST gap) moves on to the next day
    for _ in 0..3 {
        let next = date
            .and_hms_opt(hour.min(23), 0, 0)
            .and_then(|naive| timezone.from_local_datetime(&naive).earliest());

        if let Some(next) = next.filter(|next| next > now) {
            return (next - now.clone()).to_std().unwrap_or(ONE_DAY);
        }

        let Some(following) = date.succ_opt() else {
            break;
        };
        date = following;
    }

    ONE_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxFuture;
    use crate::config::AggregatorConfig;
    use crate::menu::html::fixtures::{JJS_DIETARY_PAGE, LUNCH_PAGE};
    use crate::models::nutrition::NutritionFacts;
    use crate::store::{InMemoryCacheStore, StoreError, StoreResult};
    use crate::testing::{StaticFoodDatabase, StaticPages};

    /// Delegates to an in-memory store but rejects writes for selected dishes.
    struct FlakyStore {
        inner: InMemoryCacheStore,
        reject_menu: &'static str,
        reject_nutrition: &'static str,
    }

    impl CacheStore for FlakyStore {
        fn clear_all(&self) -> BoxFuture<'_, StoreResult<()>> {
            self.inner.clear_all()
        }

        fn insert_menu_item<'a>(&'a self, item: &'a MenuItem) -> BoxFuture<'a, StoreResult<()>> {
            if item.food_name == self.reject_menu {
                return Box::pin(async { Err(StoreError::Unavailable(String::from("rejected"))) });
            }
            self.inner.insert_menu_item(item)
        }

        fn upsert_nutrition<'a>(
            &'a self,
            record: &'a NutritionRecord,
        ) -> BoxFuture<'a, StoreResult<()>> {
            if record.food_name == self.reject_nutrition {
                return Box::pin(async { Err(StoreError::Unavailable(String::from("rejected"))) });
            }
            self.inner.upsert_nutrition(record)
        }

        fn find_nutrition<'a>(
            &'a self,
            food_name: &'a str,
            dining_hall: &'a str,
        ) -> BoxFuture<'a, StoreResult<Option<NutritionRecord>>> {
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
            calories: Some(285.0),
            ..NutritionFacts::fallback()
        }
    }

    fn service(pages: StaticPages, store: Arc<dyn CacheStore>) -> CacheRefreshService {
        let config = Arc::new(AggregatorConfig {
            menu_base_url: String::from("https://menus.test"),
            dining_base_url: String::from("https://dining.test"),
            ..AggregatorConfig::default()
        });
        let database = Arc::new(StaticFoodDatabase::new().with("pizza", pizza_facts()));

        let scraper = Arc::new(MenuScraper::new(Arc::new(pages), config));
        let nutrition = Arc::new(NutritionService::new(database, store.clone(), 100));
        CacheRefreshService::new(scraper, store, nutrition)
    }

    fn lunch_pages() -> StaticPages {
        StaticPages::new()
            .with_page("https://menus.test/lunch", LUNCH_PAGE)
            .with_page("https://dining.test/content/jjs-place-0", JJS_DIETARY_PAGE)
    }

    #[tokio::test]
    async fn repopulates_and_enriches_the_cache() {
        let store = Arc::new(InMemoryCacheStore::new());
        let stale = MenuItem::new(
            crate::models::menu_items::MealPeriod::Dinner,
            "Ferris",
            "5-8",
            "Main",
            "Yesterday's Soup",
        );
        store.insert_menu_item(&stale).await.unwrap();
        let service = service(lunch_pages(), store.clone());

        let outcome = service.refresh_cache().await;

        let RefreshOutcome::Completed(summary) = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(summary.menu_items, 6);
        // status items are not enriched
        assert_eq!(summary.nutrition_records, 4);
        assert_eq!(service.state(), RefreshState::Idle);

        let items = store.list_menu_items().await.unwrap();
        assert_eq!(items.len(), 6);
        assert!(items.iter().all(|item| item.food_name != "Yesterday's Soup"));
        assert!(items.iter().all(|item| item.last_updated.is_some()));

        let pizza = store.find_nutrition("Pizza", "JJ's").await.unwrap().unwrap();
        assert_eq!(pizza.nutrition, pizza_facts());
        let tacos = store.find_nutrition("Tacos", "Hewitt").await.unwrap().unwrap();
        assert_eq!(tacos.nutrition, NutritionFacts::fallback());
        assert!(store.find_nutrition("Closed", "John Jay").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_scrape_leaves_previous_cache_untouched() {
        let store = Arc::new(InMemoryCacheStore::new());
        let previous = MenuItem::new(
            crate::models::menu_items::MealPeriod::Lunch,
            "JJ's",
            "11-3",
            "Grill",
            "Burger",
        );
        store.insert_menu_item(&previous).await.unwrap();
        let service = service(StaticPages::new(), store.clone());
        let states = service.subscribe();

        let outcome = service.refresh_cache().await;

        assert!(!outcome.is_success());
        let RefreshOutcome::Failed { error } = outcome else {
            panic!("expected failure");
        };
        assert!(error.contains("failed to fetch menu data"));
        assert_eq!(store.list_menu_items().await.unwrap().len(), 1);
        assert_eq!(*states.borrow(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn per_item_write_failures_are_skipped() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryCacheStore::new(),
            reject_menu: "Burger",
            reject_nutrition: "Garlic Knots",
        });
        let service = service(lunch_pages(), store.clone());

        let RefreshOutcome::Completed(summary) = service.refresh_cache().await else {
            panic!("expected the run to complete");
        };

        assert_eq!(summary.menu_items, 5);
        assert_eq!(summary.skipped_menu_items, 1);
        // the rejected menu item is never enriched
        assert_eq!(summary.nutrition_records, 2);
        assert_eq!(summary.skipped_nutrition_records, 1);

        let records = store.list_nutrition().await.unwrap();
        let mut names: Vec<_> = records.iter().map(|r| r.food_name.as_str()).collect();
        names.sort();
        assert_eq!(names, ["Pizza", "Tacos"]);
    }

    #[tokio::test]
    async fn concurrent_trigger_is_a_no_op() {
        let store = Arc::new(InMemoryCacheStore::new());
        let service = service(lunch_pages(), store.clone());

        let guard = service.run_lock.lock().await;
        let outcome = service.refresh_cache().await;
        drop(guard);

        assert_eq!(
            outcome,
            RefreshOutcome::Skipped {
                state: RefreshState::Idle
            }
        );
        assert!(outcome.is_success());
        assert!(store.list_menu_items().await.unwrap().is_empty());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(RefreshOutcome::Skipped {
            state: RefreshState::Enriching,
        })
        .unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["state"], "enriching");

        let json = serde_json::to_value(RefreshOutcome::Failed {
            error: String::from("boom"),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn waits_until_the_next_refresh_hour() {
        let at = |h, m| Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap();

        assert_eq!(duration_until_next(&at(3, 0), 4), Duration::from_secs(60 * 60));
        assert_eq!(duration_until_next(&at(4, 0), 4), ONE_DAY);
        assert_eq!(
            duration_until_next(&at(5, 30), 4),
            Duration::from_secs(22 * 60 * 60 + 30 * 60)
        );
        assert_eq!(
            duration_until_next(&at(23, 59), 0),
            Duration::from_secs(60)
        );
    }
}
