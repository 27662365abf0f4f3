use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

pub const STATUS_FOOD_TYPE: &str = "Status";
pub const CLOSED_FOOD_NAME: &str = "Closed";
pub const NO_ITEMS_FOOD_NAME: &str = "No items available";
pub const CLOSED_HOURS: &str = "Closed";

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MealPeriod {
    #[display("breakfast")]
    Breakfast,
    #[display("lunch")]
    Lunch,
    #[display("dinner")]
    Dinner,
    #[display("latenight")]
    LateNight,
}

impl MealPeriod {
    pub const ALL: [MealPeriod; 4] = [
        MealPeriod::Breakfast,
        MealPeriod::Lunch,
        MealPeriod::Dinner,
        MealPeriod::LateNight,
    ];
}

impl FromStr for MealPeriod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealPeriod::Breakfast),
            "lunch" => Ok(MealPeriod::Lunch),
            "dinner" => Ok(MealPeriod::Dinner),
            "latenight" => Ok(MealPeriod::LateNight),
            other => Err(format!("unknown meal period `{other}`")),
        }
    }
}

/// One dish offered at one dining hall during one meal period.
///
/// Natural key is `(dining_hall, meal_period, food_name)`. A closed hall, or one that listed no
/// food, is represented by a single status item rather than by missing rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(rename = "mealType")]
    pub meal_period: MealPeriod,
    pub dining_hall: String,
    pub hours: String,
    pub food_type: String,
    pub food_name: String,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl MenuItem {
    pub fn new(
        meal_period: MealPeriod,
        dining_hall: impl Into<String>,
        hours: impl Into<String>,
        food_type: impl Into<String>,
        food_name: impl Into<String>,
    ) -> Self {
        Self {
            meal_period,
            dining_hall: dining_hall.into(),
            hours: hours.into(),
            food_type: food_type.into(),
            food_name: food_name.into(),
            dietary_preferences: Vec::new(),
            contains: Vec::new(),
            last_updated: None,
        }
    }

    pub fn closed(meal_period: MealPeriod, dining_hall: impl Into<String>) -> Self {
        Self::new(
            meal_period,
            dining_hall,
            CLOSED_HOURS,
            STATUS_FOOD_TYPE,
            CLOSED_FOOD_NAME,
        )
    }

    pub fn no_items(
        meal_period: MealPeriod,
        dining_hall: impl Into<String>,
        hours: impl Into<String>,
    ) -> Self {
        Self::new(
            meal_period,
            dining_hall,
            hours,
            STATUS_FOOD_TYPE,
            NO_ITEMS_FOOD_NAME,
        )
    }

    pub fn is_sentinel(&self) -> bool {
        self.food_type == STATUS_FOOD_TYPE
            && (self.food_name == CLOSED_FOOD_NAME || self.food_name == NO_ITEMS_FOOD_NAME)
    }
}

/// Scraped menu grouped by meal period, in scrape order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuData {
    #[serde(default)]
    pub breakfast: Vec<MenuItem>,
    #[serde(default)]
    pub lunch: Vec<MenuItem>,
    #[serde(default)]
    pub dinner: Vec<MenuItem>,
    #[serde(default)]
    pub latenight: Vec<MenuItem>,
}

impl MenuData {
    pub fn period(&self, period: MealPeriod) -> &[MenuItem] {
        match period {
            MealPeriod::Breakfast => &self.breakfast,
            MealPeriod::Lunch => &self.lunch,
            MealPeriod::Dinner => &self.dinner,
            MealPeriod::LateNight => &self.latenight,
        }
    }

    pub fn period_mut(&mut self, period: MealPeriod) -> &mut Vec<MenuItem> {
        match period {
            MealPeriod::Breakfast => &mut self.breakfast,
            MealPeriod::Lunch => &mut self.lunch,
            MealPeriod::Dinner => &mut self.dinner,
            MealPeriod::LateNight => &mut self.latenight,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MenuItem> {
        MealPeriod::ALL
            .into_iter()
            .flat_map(move |period| self.period(period).iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MenuItem> {
        self.breakfast
            .iter_mut()
            .chain(self.lunch.iter_mut())
            .chain(self.dinner.iter_mut())
            .chain(self.latenight.iter_mut())
    }

    pub fn len(&self) -> usize {
        MealPeriod::ALL
            .into_iter()
            .map(|period| self.period(period).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, item: MenuItem) {
        self.period_mut(item.meal_period).push(item);
    }
}

impl FromIterator<MenuItem> for MenuData {
    fn from_iter<I: IntoIterator<Item = MenuItem>>(iter: I) -> Self {
        let mut menu = MenuData::default();
        for item in iter {
            menu.push(item);
        }
        menu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_period_round_trips_through_text() {
        for period in MealPeriod::ALL {
            assert_eq!(period.to_string().parse::<MealPeriod>(), Ok(period));
        }
        assert!("brunch".parse::<MealPeriod>().is_err());
    }

    #[test]
    fn menu_item_serializes_with_client_field_names() {
        let item = MenuItem::new(MealPeriod::LateNight, "JJ's", "8pm-10am", "Grill", "Burger");
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["mealType"], "latenight");
        assert_eq!(json["diningHall"], "JJ's");
        assert_eq!(json["foodType"], "Grill");
        assert_eq!(json["foodName"], "Burger");
        assert_eq!(json["dietaryPreferences"], serde_json::json!([]));
    }

    #[test]
    fn groups_items_by_period_in_insertion_order() {
        let menu: MenuData = [
            MenuItem::new(MealPeriod::Dinner, "Ferris", "5-8", "Main", "Soup"),
            MenuItem::new(MealPeriod::Lunch, "Ferris", "11-2", "Main", "Pasta"),
            MenuItem::closed(MealPeriod::Dinner, "John Jay"),
        ]
        .into_iter()
        .collect();

        assert_eq!(menu.len(), 3);
        assert_eq!(menu.lunch.len(), 1);
        let dinner: Vec<_> = menu.dinner.iter().map(|i| i.food_name.as_str()).collect();
        assert_eq!(dinner, ["Soup", "Closed"]);
        assert!(menu.dinner[1].is_sentinel());
        assert!(!menu.dinner[0].is_sentinel());
    }
}
