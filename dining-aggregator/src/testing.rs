//! In-process stand-ins for the external collaborators, used by tests across the workspace.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::menu::ScrapeError;
use crate::models::nutrition::NutritionFacts;
use crate::{BoxFuture, FoodDatabase, FoodQuery, PageSource};

/// Food database answering from a fixed table keyed by query text.
#[derive(Debug, Default)]
pub struct StaticFoodDatabase {
    foods: HashMap<String, NutritionFacts>,
    failing: HashSet<String>,
    queries: Mutex<Vec<String>>,
}

impl StaticFoodDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, facts: NutritionFacts) -> Self {
        self.foods.insert(query.to_owned(), facts);
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_owned());
        self
    }

    /// Every query text received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

impl FoodDatabase for StaticFoodDatabase {
    fn search<'a>(
        &'a self,
        query: &'a FoodQuery,
    ) -> BoxFuture<'a, anyhow::Result<Option<NutritionFacts>>> {
        Box::pin(async move {
            if let Ok(mut queries) = self.queries.lock() {
                queries.push(query.text.clone());
            }

            if self.failing.contains(&query.text) {
                anyhow::bail!("lookup for `{}` failed", query.text);
            }

            Ok(self.foods.get(&query.text).cloned())
        })
    }
}

/// Page source serving fixture bodies by URL. Unknown URLs answer with a 404 status.
#[derive(Debug, Default)]
pub struct StaticPages {
    pages: HashMap<String, String>,
    statuses: HashMap<String, u16>,
    requested: Mutex<Vec<String>>,
}

impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Answers `url` with a non-success `status` instead of a body.
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.statuses.insert(url.into(), status);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|requested| requested.clone())
            .unwrap_or_default()
    }
}

impl PageSource for StaticPages {
    fn fetch_page<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ScrapeError>> {
        Box::pin(async move {
            if let Ok(mut requested) = self.requested.lock() {
                requested.push(url.to_owned());
            }

            if let Some(status) = self.statuses.get(url) {
                return Err(ScrapeError::Status {
                    url: url.to_owned(),
                    status: *status,
                });
            }

            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::Status {
                    url: url.to_owned(),
                    status: 404,
                })
        })
    }
}
