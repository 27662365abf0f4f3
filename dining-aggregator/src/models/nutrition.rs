use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Hours a resolved record is considered current.
pub const NUTRITION_TTL_HOURS: i64 = 24;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Nutrient {
    #[display("calories")]
    Calories,
    #[display("protein")]
    Protein,
    #[display("carbs")]
    Carbs,
    #[display("fat")]
    Fat,
    #[display("fiber")]
    Fiber,
    #[display("sugars")]
    Sugars,
    #[display("sodium")]
    Sodium,
    #[display("calcium")]
    Calcium,
    #[display("iron")]
    Iron,
    #[display("potassium")]
    Potassium,
}

/// Nutrition facts for one serving. A `None` nutrient was not reported by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub sugars: Option<f64>,
    #[serde(default)]
    pub sodium: Option<f64>,
    #[serde(default)]
    pub calcium: Option<f64>,
    #[serde(default)]
    pub iron: Option<f64>,
    #[serde(default)]
    pub potassium: Option<f64>,
    pub serving_size: f64,
    pub serving_unit: String,
}

impl NutritionFacts {
    /// Fixed vector used whenever a dish cannot be resolved anywhere.
    pub fn fallback() -> Self {
        Self {
            calories: Some(250.0),
            protein: Some(8.0),
            carbs: Some(30.0),
            fat: Some(10.0),
            fiber: Some(2.0),
            sugars: Some(5.0),
            sodium: Some(500.0),
            calcium: Some(100.0),
            iron: Some(2.0),
            potassium: Some(200.0),
            serving_size: 100.0,
            serving_unit: String::from("g"),
        }
    }

    pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fat => self.fat,
            Nutrient::Fiber => self.fiber,
            Nutrient::Sugars => self.sugars,
            Nutrient::Sodium => self.sodium,
            Nutrient::Calcium => self.calcium,
            Nutrient::Iron => self.iron,
            Nutrient::Potassium => self.potassium,
        }
    }
}

/// Persisted nutrition facts for one `(food_name, dining_hall)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionRecord {
    pub food_name: String,
    pub dining_hall: String,
    pub nutrition: NutritionFacts,
    pub last_updated: DateTime<Utc>,
    pub next_refresh: DateTime<Utc>,
}

impl NutritionRecord {
    pub fn new(
        food_name: impl Into<String>,
        dining_hall: impl Into<String>,
        nutrition: NutritionFacts,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            food_name: food_name.into(),
            dining_hall: dining_hall.into(),
            nutrition,
            last_updated: now,
            next_refresh: now + chrono::Duration::hours(NUTRITION_TTL_HOURS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_refresh
    }
}
