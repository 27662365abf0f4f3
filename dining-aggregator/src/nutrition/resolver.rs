use derive_more::Display;

use crate::models::nutrition::NutritionFacts;
use crate::{FoodDatabase, FoodQuery};

/// Generic terms searched when the dish name itself has no match. The first key contained in
/// the lower-cased dish name wins.
pub const FOOD_SYNONYMS: &[(&str, &str)] = &[
    ("french toast", "french toast"),
    ("scrambled eggs", "scrambled eggs"),
    ("hash brown", "hash brown potatoes"),
    ("ham", "ham"),
    ("turkey sausage", "turkey sausage"),
    ("biscuits", "biscuit"),
    ("carrots", "carrots"),
    ("egg", "egg"),
    ("potatoes", "potatoes"),
    ("chicken", "chicken"),
    ("pizza", "pizza"),
    ("rice", "rice"),
    ("salad", "salad"),
    ("muffin", "muffin"),
    ("yogurt", "yogurt"),
    ("granola", "granola"),
];

pub fn synonym_for(food_name: &str) -> Option<&'static str> {
    let name = food_name.to_lowercase();
    FOOD_SYNONYMS
        .iter()
        .find(|(key, _)| name.contains(key))
        .map(|(_, synonym)| *synonym)
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// Full dish name, every word required.
    #[display("exact")]
    Exact,
    /// First word of the dish name only.
    #[display("first_word")]
    FirstWord,
    #[display("synonym")]
    Synonym,
}

impl LookupStrategy {
    pub const CHAIN: [LookupStrategy; 3] = [
        LookupStrategy::Exact,
        LookupStrategy::FirstWord,
        LookupStrategy::Synonym,
    ];

    /// The query this strategy would send, or `None` when it does not apply to the name.
    pub fn query(self, food_name: &str) -> Option<FoodQuery> {
        let name = food_name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }

        match self {
            LookupStrategy::Exact => Some(FoodQuery::new(name, true)),
            LookupStrategy::FirstWord => {
                let first = name.split_whitespace().next()?;
                // same search as the exact one for single-word names
                (first != name).then(|| FoodQuery::new(first, false))
            }
            LookupStrategy::Synonym => {
                synonym_for(&name).map(|synonym| FoodQuery::new(synonym, false))
            }
        }
    }
}

/// Runs the lookup strategies in order and stops at the first match.
pub async fn resolve(
    database: &dyn FoodDatabase,
    food_name: &str,
) -> Option<(LookupStrategy, NutritionFacts)> {
    for strategy in LookupStrategy::CHAIN {
        let Some(query) = strategy.query(food_name) else {
            continue;
        };

        match database.search(&query).await {
            Ok(Some(facts)) => {
                tracing::debug!(%food_name, %strategy, query = %query.text, "nutrition match");
                return Some((strategy, facts));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(%food_name, %strategy, error = ?e, "nutrition lookup failed")
            }
        }
    }

    None
}
