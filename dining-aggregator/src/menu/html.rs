//! Extraction of raw listings from the two sites' markup.

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};

use super::ScrapeError;
use super::dietary::{DietaryIndex, DietaryTags};
use super::grouping::{HallListing, MenuRow, normalize_text};
use crate::models::menu_items::MealPeriod;

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("`{css}`: {e:?}")))
}

fn text_of(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(text_of)
}

/// Reads every dining hall column of a meal period page.
pub fn parse_meal_page(markup: &str) -> Result<Vec<HallListing>, ScrapeError> {
    let column = selector(".col")?;
    let title = selector("h3")?;
    let hours = selector(".hours")?;
    let menu = selector(".menu")?;
    let row = selector(".food-type, .food-name")?;

    let document = Html::parse_document(markup);
    let mut listings = Vec::new();

    for col in document.select(&column) {
        let dining_hall = first_text(col, &title).unwrap_or_default();
        if dining_hall.is_empty() {
            continue;
        }

        let menu_block = col.select(&menu).next();
        let rows = menu_block
            .map(|block| {
                block
                    .select(&row)
                    .map(|element| {
                        let text = element.text().collect::<String>();
                        if element.value().classes().any(|class| class == "food-type") {
                            MenuRow::Heading(text)
                        } else {
                            MenuRow::Food(text)
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        listings.push(HallListing {
            dining_hall,
            hours: first_text(col, &hours).unwrap_or_default(),
            menu_text: menu_block.map(text_of),
            rows,
        });
    }

    Ok(listings)
}

/// Section titles are free text; anything unrecognized is a lunch menu.
pub fn period_from_title(title: &str) -> MealPeriod {
    let title = title.to_lowercase();

    if title.contains("breakfast") {
        MealPeriod::Breakfast
    } else if title.contains("dinner") {
        MealPeriod::Dinner
    } else if title.contains("late") || title.contains("night") {
        MealPeriod::LateNight
    } else {
        MealPeriod::Lunch
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(normalize_text)
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Reads the dietary and allergen tags a dining hall publishes per meal period.
pub fn parse_dietary_page(markup: &str) -> Result<DietaryIndex, ScrapeError> {
    let section = selector(".menus.striped")?;
    let station = selector(".wrapper")?;
    let meal = selector(".meal-item")?;
    let meal_title = selector(".meal-title")?;
    let prefs = selector(".meal-prefs strong")?;
    let allergens = selector(".meal-allergens em")?;

    let document = Html::parse_document(markup);
    let mut periods: HashMap<MealPeriod, HashMap<String, DietaryTags>> = HashMap::new();

    for menu in document.select(&section) {
        let period = period_from_title(
            menu.value()
                .attr("data-date-range-title")
                .unwrap_or_default(),
        );
        let foods = periods.entry(period).or_default();

        for item in menu.select(&station).flat_map(|s| s.select(&meal)) {
            let Some(food_name) = first_text(item, &meal_title).filter(|name| !name.is_empty())
            else {
                continue;
            };

            let dietary_preferences = first_text(item, &prefs)
                .map(|text| split_list(&text))
                .unwrap_or_default();
            let contains = first_text(item, &allergens)
                .map(|text| split_list(&text.replace("Contains:", "")))
                .unwrap_or_default();

            foods.insert(
                food_name,
                DietaryTags {
                    dietary_preferences,
                    contains,
                },
            );
        }
    }

    Ok(DietaryIndex::new(periods))
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn reads_columns_in_document_order() {
        let listings = parse_meal_page(LUNCH_PAGE).unwrap();

        let halls: Vec<_> = listings.iter().map(|l| l.dining_hall.as_str()).collect();
        assert_eq!(halls, ["JJ's", "John Jay", "Ferris", "Hewitt"]);

        let jjs = &listings[0];
        assert_eq!(jjs.hours, "12pm - 10am");
        assert_eq!(
            jjs.rows[..2],
            [
                MenuRow::Heading(String::from("Pizza Station")),
                MenuRow::Food(String::from("Pizza")),
            ]
        );
        assert_eq!(jjs.rows.len(), 5);
        assert!(listings[1].is_closed());
        assert!(!listings[2].is_closed());
    }

    #[test]
    fn reads_dietary_tags_per_period() {
        let index = parse_dietary_page(JJS_DIETARY_PAGE).unwrap();

        let pizza = index.get(MealPeriod::Lunch, "Pizza").unwrap();
        assert_eq!(pizza.dietary_preferences, ["Vegetarian", "Halal"]);
        assert_eq!(pizza.contains, ["Gluten", "Dairy"]);

        let burger = index.get(MealPeriod::Dinner, "Burger").unwrap();
        assert!(burger.dietary_preferences.is_empty());
        assert_eq!(burger.contains, ["Gluten"]);
        assert!(index.get(MealPeriod::Lunch, "Burger").is_none());
    }

    #[test]
    fn section_titles_map_to_periods() {
        assert_eq!(period_from_title("Breakfast"), MealPeriod::Breakfast);
        assert_eq!(period_from_title("Late Night Snacks"), MealPeriod::LateNight);
        assert_eq!(period_from_title("DINNER"), MealPeriod::Dinner);
        assert_eq!(period_from_title("Brunch"), MealPeriod::Lunch);
        assert_eq!(period_from_title(""), MealPeriod::Lunch);
    }
}
