use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::models::menu_items::MealPeriod;

const DEFAULT_MENU_BASE_URL: &str = "https://liondine.com";
const DEFAULT_DINING_BASE_URL: &str = "https://dining.columbia.edu";
const DEFAULT_USDA_API_URL: &str = "https://api.nal.usda.gov/fdc/v1";
const DEFAULT_OCCUPANCY_API_URL: &str =
    "https://dining.columbia.edu/cu_dining/rest/occuspace_locations";
const DEFAULT_DIRECTORY_URL: &str = "https://directory.columbia.edu/people/uni";

/// Dining halls whose nutrition pages live on the dining site, with their page paths.
pub const DINING_HALL_PAGES: &[(&str, &str)] = &[
    ("JJ's", "/content/jjs-place-0"),
    ("Ferris", "/content/ferris-booth-commons-0"),
    ("Faculty House", "/content/faculty-house-0"),
    ("Chef Mike's", "/chef-mikes"),
    ("Johnny's", "/johnnys"),
    ("The Fac Shack", "/content/fac-shack-0"),
    ("John Jay", "/content/john-jay-dining-hall"),
    ("Grace Dodge", "/content/grace-dodge-dining-hall-0"),
    ("Chef Don's", "/content/chef-dons-pizza-pi"),
];

/// Barnard halls publish through a different site and never take part in the nutrition merge.
pub const BARNARD_DINING_HALLS: &[&str] = &["Diana", "Hewitt"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub menu_base_url: String,
    pub dining_base_url: String,
    pub usda_api_url: String,
    pub usda_api_key: String,
    pub usda_requests_per_hour: u32,
    pub occupancy_api_url: String,
    pub directory_url: String,
    /// Upper bound for a single page load or upstream request.
    pub page_timeout: Duration,
    /// Local hour of the daily refresh run.
    pub refresh_hour: u32,
    pub menu_stale_after: chrono::Duration,
    pub nutrition_memory_capacity: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            menu_base_url: DEFAULT_MENU_BASE_URL.into(),
            dining_base_url: DEFAULT_DINING_BASE_URL.into(),
            usda_api_url: DEFAULT_USDA_API_URL.into(),
            usda_api_key: String::from("DEMO_KEY"),
            usda_requests_per_hour: 1000,
            occupancy_api_url: DEFAULT_OCCUPANCY_API_URL.into(),
            directory_url: DEFAULT_DIRECTORY_URL.into(),
            page_timeout: Duration::from_secs(30),
            refresh_hour: 4,
            menu_stale_after: chrono::Duration::hours(24),
            nutrition_memory_capacity: 10_000,
        }
    }
}

impl AggregatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let usda_requests_per_hour = parse_or("USDA_REQUESTS_PER_HOUR", 1000u32)?;
        if usda_requests_per_hour == 0 {
            return Err(ConfigError::Invalid {
                key: "USDA_REQUESTS_PER_HOUR",
                message: String::from("must be greater than zero"),
            });
        }

        let refresh_hour = parse_or("REFRESH_HOUR", defaults.refresh_hour)?;
        if refresh_hour > 23 {
            return Err(ConfigError::Invalid {
                key: "REFRESH_HOUR",
                message: format!("{refresh_hour} is not an hour of the day"),
            });
        }

        let page_timeout = timeout_from_secs(parse_or("PAGE_TIMEOUT_SECS", 30u64)?)?;

        let stale_hours = parse_or("MENU_STALE_AFTER_HOURS", 24i64)?;
        let menu_stale_after = stale_after(stale_hours)?;

        Ok(Self {
            menu_base_url: string_or("MENU_BASE_URL", defaults.menu_base_url),
            dining_base_url: string_or("DINING_BASE_URL", defaults.dining_base_url),
            usda_api_url: string_or("USDA_API_URL", defaults.usda_api_url),
            usda_api_key: string_or("USDA_API_KEY", defaults.usda_api_key),
            usda_requests_per_hour,
            occupancy_api_url: string_or("OCCUPANCY_API_URL", defaults.occupancy_api_url),
            directory_url: string_or("DIRECTORY_URL", defaults.directory_url),
            page_timeout,
            refresh_hour,
            menu_stale_after,
            nutrition_memory_capacity: parse_or(
                "NUTRITION_MEMORY_CAPACITY",
                defaults.nutrition_memory_capacity,
            )?,
        })
    }

    pub fn meal_page_url(&self, period: MealPeriod) -> String {
        format!("{}/{}", self.menu_base_url.trim_end_matches('/'), period)
    }

    pub fn dining_hall_page_url(&self, dining_hall: &str) -> Option<String> {
        DINING_HALL_PAGES
            .iter()
            .find(|(name, _)| *name == dining_hall)
            .map(|(_, path)| format!("{}{path}", self.dining_base_url.trim_end_matches('/')))
    }
}

pub fn is_barnard_hall(dining_hall: &str) -> bool {
    BARNARD_DINING_HALLS.contains(&dining_hall)
}

fn stale_after(hours: i64) -> Result<chrono::Duration, ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        key: "MENU_STALE_AFTER_HOURS",
        message,
    };

    if hours < 1 {
        return Err(invalid(String::from("must be at least one hour")));
    }

    chrono::Duration::try_hours(hours)
        .ok_or_else(|| invalid(format!("{hours} hours is out of range")))
}

fn timeout_from_secs(secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: "PAGE_TIMEOUT_SECS",
            message: String::from("must be greater than zero"),
        });
    }

    Ok(Duration::from_secs(secs))
}

fn string_or(key: &'static str, default: String) -> String {
    match dotenvy::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => {
            tracing::debug!(%key, %default, "env var not set, using default");
            default
        }
    }
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match dotenvy::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
