use crate::models::nutrition::{Nutrient, NutritionFacts};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdealRange {
    pub nutrient: Nutrient,
    pub min: f64,
    pub max: f64,
    pub weight: f64,
}

pub const IDEAL_RANGES: [IdealRange; 6] = [
    IdealRange {
        nutrient: Nutrient::Calories,
        min: 400.0,
        max: 800.0,
        weight: 0.25,
    },
    IdealRange {
        nutrient: Nutrient::Protein,
        min: 15.0,
        max: 30.0,
        weight: 0.25,
    },
    IdealRange {
        nutrient: Nutrient::Carbs,
        min: 45.0,
        max: 75.0,
        weight: 0.15,
    },
    IdealRange {
        nutrient: Nutrient::Fat,
        min: 10.0,
        max: 25.0,
        weight: 0.15,
    },
    IdealRange {
        nutrient: Nutrient::Fiber,
        min: 4.0,
        max: 10.0,
        weight: 0.10,
    },
    IdealRange {
        nutrient: Nutrient::Sodium,
        min: 200.0,
        max: 800.0,
        weight: 0.10,
    },
];

impl IdealRange {
    /// 1.0 inside the band, linear decay below it, `max / value` above it.
    pub fn score(&self, value: f64) -> f64 {
        if value < self.min {
            value / self.min
        } else if value > self.max {
            self.max / value
        } else {
            1.0
        }
    }
}

/// Weighted health score in `[0, 1]`, or `None` when the facts carry none of the scored
/// nutrients. Zero counts as absent, since upstream reports missing nutrients as 0.
pub fn health_score(facts: &NutritionFacts) -> Option<f64> {
    let (total, weight) = IDEAL_RANGES
        .iter()
        .filter_map(|range| {
            facts
                .get(range.nutrient)
                .filter(|value| value.is_finite() && *value > 0.0)
                .map(|value| (range.score(value) * range.weight, range.weight))
        })
        .fold((0.0, 0.0), |(total, weight), (score, w)| {
            (total + score, weight + w)
        });

    (weight > 0.0).then(|| total / weight)
}

/// Same as [`health_score`] but scores facts without any scored nutrient as 0.
pub fn calculate_health_score(facts: &NutritionFacts) -> f64 {
    health_score(facts).unwrap_or(0.0)
}
