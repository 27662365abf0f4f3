use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use dining_aggregator::models::menu_items::{MenuData, MenuItem};
use dining_aggregator::models::nutrition::NutritionFacts;
use dining_aggregator::recommend::{ScoredMeal, join_meals};
use dining_aggregator::refresh::RefreshState;
use serde::Serialize;

use crate::AppState;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuOrigin {
    Cache,
    Live,
    StaleCache,
    /// The cache is being rebuilt and holds nothing yet.
    Refreshing,
}

pub struct LoadedMenu {
    pub menu: MenuData,
    pub meals: Vec<ScoredMeal>,
    pub origin: MenuOrigin,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Serves the cache while it is fresh, scrapes otherwise, and falls back to a stale cache when
/// the scrape fails. An empty cache during a refresh run is answered with no data instead of a
/// second scrape.
#[tracing::instrument(skip_all)]
pub async fn load_menu(state: &AppState) -> Result<LoadedMenu, AppError> {
    let cached = state.store.list_menu_items().await.unwrap_or_else(|e| {
        tracing::warn!(error = ?e, "failed to read menu cache");
        Vec::new()
    });

    let last_updated = cached.iter().filter_map(|item| item.last_updated).max();
    let fresh = last_updated.is_some_and(|at| Utc::now() - at <= state.config.menu_stale_after);

    if !cached.is_empty() && fresh {
        tracing::debug!(items = cached.len(), "serving cached menu");
        return Ok(from_cache(state, cached, MenuOrigin::Cache, last_updated).await);
    }

    let refresh_state = state.refresher.state();
    if cached.is_empty() && refresh_state != RefreshState::Idle {
        tracing::info!(%refresh_state, "cache is being rebuilt, serving no data");
        return Ok(LoadedMenu {
            menu: MenuData::default(),
            meals: Vec::new(),
            origin: MenuOrigin::Refreshing,
            last_updated: None,
        });
    }

    match state.scraper.scrape_menu_data().await.into_result() {
        Ok(menu) => {
            let meals = score_live_menu(state, &menu).await;
            Ok(LoadedMenu {
                menu,
                meals,
                origin: MenuOrigin::Live,
                last_updated: Some(Utc::now()),
            })
        }
        Err(error) if !cached.is_empty() => {
            tracing::warn!(%error, "live scrape failed, serving stale cache");
            Ok(from_cache(state, cached, MenuOrigin::StaleCache, last_updated).await)
        }
        Err(error) => {
            tracing::error!(%error, "live scrape failed and no cache is available");
            Err(AppError::ServerError(error))
        }
    }
}

/// Scores whatever the cache holds right now. An empty cache is not an error.
#[tracing::instrument(skip_all)]
pub async fn cached_meals(state: &AppState) -> Result<Vec<ScoredMeal>, AppError> {
    let items = state.store.list_menu_items().await?;
    let nutrition = state.store.list_nutrition().await?;
    Ok(join_meals(items, &nutrition))
}

async fn from_cache(
    state: &AppState,
    items: Vec<MenuItem>,
    origin: MenuOrigin,
    last_updated: Option<DateTime<Utc>>,
) -> LoadedMenu {
    let nutrition = state.store.list_nutrition().await.unwrap_or_else(|e| {
        tracing::warn!(error = ?e, "failed to read nutrition cache");
        Vec::new()
    });

    let menu = items.iter().cloned().collect();
    LoadedMenu {
        menu,
        meals: join_meals(items, &nutrition),
        origin,
        last_updated,
    }
}

async fn score_live_menu(state: &AppState, menu: &MenuData) -> Vec<ScoredMeal> {
    let mut names_by_hall: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for item in menu.iter().filter(|item| !item.is_sentinel()) {
        names_by_hall
            .entry(item.dining_hall.as_str())
            .or_default()
            .push(item.food_name.clone());
    }

    let mut facts: HashMap<(String, String), NutritionFacts> = HashMap::new();
    for (dining_hall, names) in names_by_hall {
        let resolved = state
            .nutrition
            .get_nutrition_data_batch(&names, dining_hall)
            .await;
        for (food_name, nutrition) in resolved {
            facts.insert((food_name, dining_hall.to_owned()), nutrition);
        }
    }

    menu.iter()
        .map(|item| {
            let nutrition = if item.is_sentinel() {
                None
            } else {
                facts
                    .get(&(item.food_name.clone(), item.dining_hall.clone()))
                    .cloned()
            };
            ScoredMeal::new(item.clone(), nutrition)
        })
        .collect()
}
