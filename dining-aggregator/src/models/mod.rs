pub mod menu_cache;
pub mod menu_items;
pub mod nutrition;
pub mod nutrition_cache;
pub mod occupancy;
