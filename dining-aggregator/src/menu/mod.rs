//! Menu scraping.
//!
//! Meal period pages list every dining hall as a column of dishes grouped under station
//! headings. Dietary and allergen tags live on a separate page per dining hall and are merged
//! onto the scraped dishes by name.

pub mod dietary;
pub mod grouping;
pub mod html;
mod source;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub use dietary::{DietaryIndex, DietaryTags};
pub use source::HttpPageSource;
use thiserror::Error;

use crate::config::{AggregatorConfig, is_barnard_hall};
use crate::models::menu_items::{MealPeriod, MenuData, MenuItem};
use crate::{Outcome, PageSource};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("`{url}` answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid selector {0}")]
    Selector(String),
}

pub struct MenuScraper {
    pages: Arc<dyn PageSource>,
    config: Arc<AggregatorConfig>,
}

impl MenuScraper {
    pub fn new(pages: Arc<dyn PageSource>, config: Arc<AggregatorConfig>) -> Self {
        Self { pages, config }
    }

    /// Scrapes all meal periods and merges dietary tags of the open dining halls.
    ///
    /// A failing period or dining hall page only leaves its slice empty. The scrape as a whole
    /// fails only when no meal period page could be read.
    #[tracing::instrument(skip(self))]
    pub async fn scrape_menu_data(&self) -> Outcome<MenuData> {
        let mut menu = MenuData::default();
        let mut failures = Vec::new();

        for period in MealPeriod::ALL {
            match self.scrape_period(period).await {
                Ok(items) => {
                    tracing::info!(%period, count = items.len(), "scraped meal period");
                    menu.period_mut(period).extend(items);
                }
                Err(e) => {
                    tracing::warn!(%period, error = ?e, "failed to scrape meal period");
                    failures.push(format!("{period}: {e}"));
                }
            }
        }

        if failures.len() == MealPeriod::ALL.len() {
            tracing::error!("no meal period could be scraped");
            return Outcome::failed(format!(
                "failed to scrape menu data: {}",
                failures.join("; ")
            ));
        }

        let mut indexes = HashMap::new();
        for dining_hall in open_dining_halls(&menu) {
            if let Some(index) = self.scrape_dietary(&dining_hall).await {
                indexes.insert(dining_hall, index);
            }
        }

        let merged = dietary::merge_dietary(&mut menu, &indexes);
        tracing::info!(
            items = menu.len(),
            merged,
            halls = indexes.len(),
            "menu scrape finished"
        );

        Outcome::ok(menu)
    }

    async fn scrape_period(&self, period: MealPeriod) -> Result<Vec<MenuItem>, ScrapeError> {
        let url = self.config.meal_page_url(period);
        let markup = self.pages.fetch_page(&url).await?;

        Ok(html::parse_meal_page(&markup)?
            .into_iter()
            .flat_map(|listing| listing.into_items(period))
            .collect())
    }

    async fn scrape_dietary(&self, dining_hall: &str) -> Option<DietaryIndex> {
        if is_barnard_hall(dining_hall) {
            tracing::debug!(%dining_hall, "skipping barnard dining hall");
            return None;
        }

        let Some(url) = self.config.dining_hall_page_url(dining_hall) else {
            tracing::debug!(%dining_hall, "no nutrition page known");
            return None;
        };

        let index = match self.pages.fetch_page(&url).await {
            Ok(markup) => html::parse_dietary_page(&markup),
            Err(e) => Err(e),
        };

        match index {
            Ok(index) => {
                tracing::debug!(%dining_hall, foods = index.len(), "scraped dietary tags");
                Some(index)
            }
            Err(e) => {
                tracing::warn!(%dining_hall, error = ?e, "failed to scrape dietary tags");
                None
            }
        }
    }
}

/// Dining halls with at least one real dish in any meal period.
pub fn open_dining_halls(menu: &MenuData) -> BTreeSet<String> {
    menu.iter()
        .filter(|item| !item.is_sentinel())
        .map(|item| item.dining_hall.clone())
        .collect()
}
