//! Rankings derived from the cached menu joined with its nutrition records.
//!
//! Nothing here is stored, every view is recomputed from the rows passed in.

use std::collections::HashMap;

use derive_more::Display;
use serde::Serialize;

use crate::models::menu_items::MenuItem;
use crate::models::nutrition::{Nutrient, NutritionFacts, NutritionRecord};
use crate::nutrition::score::health_score;

pub const HEALTHIEST_COUNT: usize = 5;
pub const NUTRIENT_LEADER_COUNT: usize = 3;
pub const HALL_TOP_ITEMS: usize = 3;

/// A menu item with its nutrition, if any was found, and the resulting score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMeal {
    #[serde(flatten)]
    pub item: MenuItem,
    pub nutrition: Option<NutritionFacts>,
    pub health_score: Option<f64>,
}

impl ScoredMeal {
    pub fn new(item: MenuItem, nutrition: Option<NutritionFacts>) -> Self {
        let health_score = nutrition.as_ref().and_then(health_score);
        Self {
            item,
            nutrition,
            health_score,
        }
    }

    fn nutrient(&self, nutrient: Nutrient) -> Option<f64> {
        self.nutrition.as_ref()?.get(nutrient)
    }
}

/// Joins items to their nutrition by `(food_name, dining_hall)`, keeping item order. Status
/// items never carry nutrition.
pub fn join_meals(items: Vec<MenuItem>, nutrition: &[NutritionRecord]) -> Vec<ScoredMeal> {
    let by_key: HashMap<(&str, &str), &NutritionFacts> = nutrition
        .iter()
        .map(|record| {
            (
                (record.food_name.as_str(), record.dining_hall.as_str()),
                &record.nutrition,
            )
        })
        .collect();

    items
        .into_iter()
        .map(|item| {
            let facts = if item.is_sentinel() {
                None
            } else {
                by_key
                    .get(&(item.food_name.as_str(), item.dining_hall.as_str()))
                    .map(|facts| (*facts).clone())
            };
            ScoredMeal::new(item, facts)
        })
        .collect()
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    #[display("ready")]
    Ready,
    #[display("no_data")]
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiningHallScore {
    pub dining_hall: String,
    pub avg_health_score: f64,
    pub menu_size: usize,
    pub top_items: Vec<ScoredMeal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientLeaders {
    pub high_protein: Vec<ScoredMeal>,
    pub low_calorie: Vec<ScoredMeal>,
    pub high_fiber: Vec<ScoredMeal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub status: DataStatus,
    pub healthiest: Vec<ScoredMeal>,
    pub by_nutrient: NutrientLeaders,
    pub by_dining_hall: Vec<DiningHallScore>,
    pub recommended_dining_hall: Option<String>,
}

pub fn recommend(meals: &[ScoredMeal]) -> Recommendations {
    let status = if meals.iter().any(|meal| !meal.item.is_sentinel()) {
        DataStatus::Ready
    } else {
        DataStatus::NoData
    };

    let by_dining_hall = rank_dining_halls(meals);
    let recommended_dining_hall = by_dining_hall
        .iter()
        .find(|hall| hall.menu_size > 0)
        .map(|hall| hall.dining_hall.clone());

    Recommendations {
        status,
        healthiest: top_by_score(meals.iter(), HEALTHIEST_COUNT),
        by_nutrient: NutrientLeaders {
            high_protein: top_by_nutrient(meals, Nutrient::Protein, true),
            low_calorie: top_by_nutrient(meals, Nutrient::Calories, false),
            high_fiber: top_by_nutrient(meals, Nutrient::Fiber, true),
        },
        by_dining_hall,
        recommended_dining_hall,
    }
}

/// Highest scores first; equal scores keep their input order.
fn top_by_score<'a>(meals: impl Iterator<Item = &'a ScoredMeal>, count: usize) -> Vec<ScoredMeal> {
    let mut scored: Vec<(f64, &ScoredMeal)> = meals
        .filter_map(|meal| meal.health_score.map(|score| (score, meal)))
        .collect();
    scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));

    scored
        .into_iter()
        .take(count)
        .map(|(_, meal)| meal.clone())
        .collect()
}

fn top_by_nutrient(meals: &[ScoredMeal], nutrient: Nutrient, descending: bool) -> Vec<ScoredMeal> {
    let mut ranked: Vec<(f64, &ScoredMeal)> = meals
        .iter()
        .filter(|meal| !meal.item.is_sentinel())
        .filter_map(|meal| meal.nutrient(nutrient).map(|value| (value, meal)))
        .collect();

    if descending {
        ranked.sort_by(|(a, _), (b, _)| b.total_cmp(a));
    } else {
        ranked.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    }

    ranked
        .into_iter()
        .take(NUTRIENT_LEADER_COUNT)
        .map(|(_, meal)| meal.clone())
        .collect()
}

/// One entry per dining hall in first-seen order, then sorted by average score. Halls without
/// any scored item average 0.
pub fn rank_dining_halls(meals: &[ScoredMeal]) -> Vec<DiningHallScore> {
    let mut halls: Vec<(&str, Vec<&ScoredMeal>)> = Vec::new();

    for meal in meals {
        let hall = meal.item.dining_hall.as_str();
        match halls.iter_mut().find(|(name, _)| *name == hall) {
            Some((_, hall_meals)) => hall_meals.push(meal),
            None => halls.push((hall, vec![meal])),
        }
    }

    let mut ranked: Vec<DiningHallScore> = halls
        .into_iter()
        .map(|(dining_hall, hall_meals)| {
            let scores: Vec<f64> = hall_meals
                .iter()
                .filter_map(|meal| meal.health_score)
                .collect();
            let avg_health_score = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };

            DiningHallScore {
                dining_hall: dining_hall.to_owned(),
                avg_health_score,
                menu_size: scores.len(),
                top_items: top_by_score(hall_meals.into_iter(), HALL_TOP_ITEMS),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.avg_health_score.total_cmp(&a.avg_health_score));
    ranked
}
