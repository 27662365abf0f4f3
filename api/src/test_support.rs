use std::sync::Arc;

use dining_aggregator::PageSource;
use dining_aggregator::config::AggregatorConfig;
use dining_aggregator::store::{CacheStore, InMemoryCacheStore};
use dining_aggregator::testing::{StaticFoodDatabase, StaticPages};

use crate::AppState;

pub const LUNCH_URL: &str = "https://menus.test/lunch";

pub const LUNCH_PAGE: &str = r#"
<div class="col">
  <h3>Ferris</h3>
  <div class="hours">11am - 4pm</div>
  <div class="menu"><div class="food-type">Main Line</div><div class="food-name">Pizza</div></div>
</div>
<div class="col">
  <h3>John Jay</h3>
  <div class="hours">Closed</div>
</div>
"#;

pub fn state(pages: StaticPages) -> (AppState, Arc<StaticPages>) {
    state_with_store(pages, Arc::new(InMemoryCacheStore::new()))
}

pub fn state_with_store(
    pages: StaticPages,
    store: Arc<dyn CacheStore>,
) -> (AppState, Arc<StaticPages>) {
    let pages = Arc::new(pages);
    (build(pages.clone(), store), pages)
}

/// Every upstream of the returned state is served by `pages`.
pub fn build(pages: Arc<dyn PageSource>, store: Arc<dyn CacheStore>) -> AppState {
    let config = Arc::new(AggregatorConfig {
        menu_base_url: String::from("https://menus.test"),
        dining_base_url: String::from("https://dining.test"),
        occupancy_api_url: String::from("https://occupancy.test/locations"),
        directory_url: String::from("https://directory.test/people/uni"),
        ..AggregatorConfig::default()
    });

    AppState::build(config, store, pages, Arc::new(StaticFoodDatabase::new()))
}
