use crate::models::menu_items::{MealPeriod, MenuItem};

pub const DEFAULT_FOOD_TYPE: &str = "General";
pub const UNKNOWN_HOURS: &str = "Hours unavailable";

/// One row of a dining hall's listing, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuRow {
    Heading(String),
    Food(String),
}

/// Everything one dining hall column shows for a meal period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HallListing {
    pub dining_hall: String,
    pub hours: String,
    /// Full text of the menu block, `None` when the column has no menu block at all.
    pub menu_text: Option<String>,
    pub rows: Vec<MenuRow>,
}

impl HallListing {
    pub fn is_closed(&self) -> bool {
        let menu_text = self
            .menu_text
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        self.hours.to_lowercase().contains("closed")
            || menu_text.contains("closed for")
            || menu_text.contains("no data available")
    }

    /// Turns the listing into menu items. Closed halls and halls without a single named dish
    /// produce exactly one status item.
    pub fn into_items(self, period: MealPeriod) -> Vec<MenuItem> {
        if self.is_closed() {
            return vec![MenuItem::closed(period, self.dining_hall)];
        }

        let hours = match normalize_text(&self.hours) {
            hours if hours.is_empty() => String::from(UNKNOWN_HOURS),
            hours => hours,
        };

        let mut tracker = FoodTypeTracker::default();
        let mut items = Vec::new();

        for row in self.rows {
            match row {
                MenuRow::Heading(heading) => tracker.enter(&heading),
                MenuRow::Food(name) => {
                    let name = normalize_text(&name);
                    if name.is_empty() {
                        continue;
                    }
                    items.push(MenuItem::new(
                        period,
                        self.dining_hall.as_str(),
                        hours.as_str(),
                        tracker.current(),
                        name,
                    ));
                }
            }
        }

        if items.is_empty() {
            items.push(MenuItem::no_items(period, self.dining_hall, hours));
        }

        items
    }
}

/// Carry-forward grouping: the last heading seen above a dish is its food type.
#[derive(Debug, Default)]
struct FoodTypeTracker {
    current: Option<String>,
}

impl FoodTypeTracker {
    fn enter(&mut self, heading: &str) {
        let heading = normalize_text(heading);
        self.current = (!heading.is_empty()).then_some(heading);
    }

    fn current(&self) -> &str {
        self.current.as_deref().unwrap_or(DEFAULT_FOOD_TYPE)
    }
}

/// Collapses every whitespace run into a single space and trims the ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
