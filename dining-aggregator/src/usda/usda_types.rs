use serde::Deserialize;

use crate::models::nutrition::NutritionFacts;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdaFoodSearchResponse {
    #[serde(default)]
    pub foods: Vec<UsdaFoodSearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdaFoodSearchFood {
    #[serde(default)]
    pub serving_size: Option<f64>,
    #[serde(default)]
    pub serving_size_unit: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<UsdaFoodNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdaFoodNutrient {
    #[serde(default)]
    pub nutrient_name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl UsdaFoodSearchFood {
    /// Value of the first nutrient whose name contains `name`, ignoring case.
    pub fn nutrient_value(&self, name: &str) -> Option<f64> {
        let needle = name.to_lowercase();

        self.food_nutrients
            .iter()
            .find(|nutrient| {
                nutrient
                    .nutrient_name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .and_then(|nutrient| nutrient.value)
    }
}

impl From<&UsdaFoodSearchFood> for NutritionFacts {
    fn from(food: &UsdaFoodSearchFood) -> Self {
        NutritionFacts {
            calories: food.nutrient_value("Energy"),
            protein: food.nutrient_value("Protein"),
            carbs: food.nutrient_value("Carbohydrate"),
            fat: food.nutrient_value("Total lipid (fat)"),
            fiber: food.nutrient_value("Fiber"),
            sugars: food.nutrient_value("Sugars"),
            sodium: food.nutrient_value("Sodium"),
            calcium: food.nutrient_value("Calcium"),
            iron: food.nutrient_value("Iron"),
            potassium: food.nutrient_value("Potassium"),
            serving_size: food.serving_size.unwrap_or(100.0),
            serving_unit: food
                .serving_size_unit
                .clone()
                .unwrap_or_else(|| String::from("g")),
        }
    }
}
