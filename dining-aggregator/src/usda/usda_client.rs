use std::num::NonZeroU32;

use anyhow::Context;
use governor::clock::QuantaClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use super::usda_types::UsdaFoodSearchResponse;
use crate::config::AggregatorConfig;
use crate::models::nutrition::NutritionFacts;
use crate::{BoxFuture, FoodDatabase, FoodQuery};

const SEARCH_DATA_TYPE: &str = "Survey (FNDDS)";

pub struct UsdaClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock>,
}

impl UsdaClient {
    pub fn new(config: &AggregatorConfig) -> anyhow::Result<Self> {
        let per_hour = NonZeroU32::new(config.usda_requests_per_hour)
            .context("USDA request quota must be greater than zero")?;

        let http = reqwest::Client::builder()
            .timeout(config.page_timeout)
            .build()
            .context("failed to build USDA http client")?;

        let api_url = config.usda_api_url.trim_end_matches('/');

        Ok(Self {
            http,
            api_url: format!("{api_url}/foods/search"),
            api_key: config.usda_api_key.clone(),
            limiter: RateLimiter::direct(Quota::per_hour(per_hour)),
        })
    }
}

impl FoodDatabase for UsdaClient {
    #[tracing::instrument(skip(self, query), fields(query = %query.text))]
    fn search<'a>(
        &'a self,
        query: &'a FoodQuery,
    ) -> BoxFuture<'a, anyhow::Result<Option<NutritionFacts>>> {
        Box::pin(async move {
            // waits until the hourly quota has room
            self.limiter.until_ready().await;

            let mut params = vec![
                ("api_key", self.api_key.clone()),
                ("query", query.text.to_lowercase()),
                ("pageSize", String::from("1")),
                ("dataType", String::from(SEARCH_DATA_TYPE)),
            ];
            if query.require_all_words {
                params.push(("requireAllWords", String::from("true")));
            }

            let response = self
                .http
                .get(&self.api_url)
                .header(reqwest::header::ACCEPT, "application/json")
                .query(&params)
                .send()
                .await
                .context("USDA search request failed")?;

            if !response.status().is_success() {
                anyhow::bail!("USDA search returned status {}", response.status());
            }

            let data = response
                .json::<UsdaFoodSearchResponse>()
                .await
                .context("malformed USDA search response")?;

            let facts = data.foods.first().map(NutritionFacts::from);
            match &facts {
                Some(_) => tracing::debug!("USDA match found"),
                None => tracing::debug!("USDA returned no foods"),
            }

            Ok(facts)
        })
    }
}
