pub mod config;
pub mod menu;
pub mod models;
pub mod nutrition;
pub mod occupancy;
pub mod recommend;
pub mod refresh;
pub mod store;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
mod usda;

use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::Serialize;
pub use usda::UsdaClient;

use crate::menu::ScrapeError;
use crate::models::nutrition::NutritionFacts;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single search against an external food database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodQuery {
    pub text: String,
    pub require_all_words: bool,
}

impl FoodQuery {
    pub fn new(text: impl Into<String>, require_all_words: bool) -> Self {
        Self {
            text: text.into(),
            require_all_words,
        }
    }
}

/// External food database used to resolve dish names into nutrition facts.
///
/// `Ok(None)` means the database answered but had no match, errors are transport or decoding
/// failures. Callers treat both as a miss and move on to the next lookup strategy.
pub trait FoodDatabase: Send + Sync {
    fn search<'a>(
        &'a self,
        query: &'a FoodQuery,
    ) -> BoxFuture<'a, anyhow::Result<Option<NutritionFacts>>>;
}

/// Fetches the raw body of a page or JSON endpoint. Callers only ever see text, so every
/// upstream can be driven from fixtures in tests. Non-success answers are
/// [`ScrapeError::Status`].
pub trait PageSource: Send + Sync {
    fn fetch_page<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ScrapeError>>;
}

/// Tagged result shape returned at every public pipeline boundary.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// A failure that still carries a best-effort payload, e.g. occupancy records marked as
    /// errored when the upstream base request failed.
    pub fn failed_with(data: T, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self
                .error
                .unwrap_or_else(|| String::from("operation returned no data"))),
        }
    }
}
