use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::menu_items::{MealPeriod, MenuData};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietaryTags {
    pub dietary_preferences: Vec<String>,
    pub contains: Vec<String>,
}

/// Dietary and allergen tags one dining hall publishes, per meal period and dish name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DietaryIndex {
    periods: HashMap<MealPeriod, HashMap<String, DietaryTags>>,
}

impl DietaryIndex {
    pub fn new(periods: HashMap<MealPeriod, HashMap<String, DietaryTags>>) -> Self {
        Self { periods }
    }

    pub fn insert(&mut self, period: MealPeriod, food_name: impl Into<String>, tags: DietaryTags) {
        self.periods
            .entry(period)
            .or_default()
            .insert(food_name.into(), tags);
    }

    pub fn get(&self, period: MealPeriod, food_name: &str) -> Option<&DietaryTags> {
        self.periods.get(&period)?.get(food_name)
    }

    /// Same period first, then the other periods in meal order; the first hit wins.
    pub fn lookup(&self, period: MealPeriod, food_name: &str) -> Option<&DietaryTags> {
        self.get(period, food_name).or_else(|| {
            MealPeriod::ALL
                .into_iter()
                .filter(|other| *other != period)
                .find_map(|other| self.get(other, food_name))
        })
    }

    pub fn len(&self) -> usize {
        self.periods.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Copies tags onto every non-status item whose dining hall has an index. Items without a match
/// keep their current tags.
pub fn merge_dietary(menu: &mut MenuData, indexes: &HashMap<String, DietaryIndex>) -> usize {
    let mut merged = 0;

    for item in menu.iter_mut().filter(|item| !item.is_sentinel()) {
        let Some(index) = indexes.get(&item.dining_hall) else {
            continue;
        };

        if let Some(tags) = index.lookup(item.meal_period, &item.food_name) {
            item.dietary_preferences = tags.dietary_preferences.clone();
            item.contains = tags.contains.clone();
            merged += 1;
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::menu_items::MenuItem;

    fn tags(prefs: &[&str], contains: &[&str]) -> DietaryTags {
        DietaryTags {
            dietary_preferences: prefs.iter().map(|s| s.to_string()).collect(),
            contains: contains.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn lunch_pizza() -> MenuData {
        [MenuItem::new(MealPeriod::Lunch, "JJ's", "12pm - 10am", "Pizza", "Pizza")]
            .into_iter()
            .collect()
    }

    #[test]
    fn merges_tags_from_the_same_period() {
        let mut index = DietaryIndex::default();
        index.insert(MealPeriod::Lunch, "Pizza", tags(&["Vegetarian"], &["Gluten"]));
        let indexes = HashMap::from([(String::from("JJ's"), index)]);

        let mut menu = lunch_pizza();
        assert_eq!(merge_dietary(&mut menu, &indexes), 1);

        assert_eq!(menu.lunch[0].dietary_preferences, ["Vegetarian"]);
        assert_eq!(menu.lunch[0].contains, ["Gluten"]);
    }

    #[test]
    fn falls_back_to_other_periods() {
        let mut index = DietaryIndex::default();
        index.insert(MealPeriod::Dinner, "Pizza", tags(&["Vegan"], &["Soy"]));
        let indexes = HashMap::from([(String::from("JJ's"), index)]);

        let mut menu = lunch_pizza();
        merge_dietary(&mut menu, &indexes);

        assert_eq!(menu.lunch[0].dietary_preferences, ["Vegan"]);
        assert_eq!(menu.lunch[0].contains, ["Soy"]);
    }

    #[test]
    fn cross_period_lookup_takes_the_first_period_in_meal_order() {
        let mut index = DietaryIndex::default();
        index.insert(MealPeriod::LateNight, "Fries", tags(&[], &["late"]));
        index.insert(MealPeriod::Breakfast, "Fries", tags(&[], &["breakfast"]));

        let found = index.lookup(MealPeriod::Dinner, "Fries").unwrap();
        assert_eq!(found.contains, ["breakfast"]);
        assert!(index.lookup(MealPeriod::Dinner, "Soup").is_none());
    }

    #[test]
    fn other_halls_and_status_items_are_untouched() {
        let mut index = DietaryIndex::default();
        index.insert(MealPeriod::Lunch, "Closed", tags(&["Vegan"], &[]));
        index.insert(MealPeriod::Lunch, "Pizza", tags(&["Vegan"], &[]));
        let indexes = HashMap::from([(String::from("Ferris"), index)]);

        let mut menu: MenuData = [
            MenuItem::closed(MealPeriod::Lunch, "Ferris"),
            MenuItem::new(MealPeriod::Lunch, "JJ's", "9-5", "Pizza", "Pizza"),
        ]
        .into_iter()
        .collect();

        assert_eq!(merge_dietary(&mut menu, &indexes), 0);
        assert!(menu.iter().all(|item| item.dietary_preferences.is_empty()));
    }
}
