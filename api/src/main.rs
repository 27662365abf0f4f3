mod error;
mod handlers;
mod routes;
mod services;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use dining_aggregator::config::AggregatorConfig;
use dining_aggregator::menu::{HttpPageSource, MenuScraper};
use dining_aggregator::nutrition::NutritionService;
use dining_aggregator::occupancy::OccupancyClient;
use dining_aggregator::refresh::CacheRefreshService;
use dining_aggregator::store::{CacheStore, PgCacheStore};
use dining_aggregator::{FoodDatabase, PageSource, UsdaClient};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::services::directory::DirectoryClient;

const REFRESH_ONCE_FLAG: &str = "--refresh-once";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AggregatorConfig>,
    pub store: Arc<dyn CacheStore>,
    pub scraper: Arc<MenuScraper>,
    pub nutrition: Arc<NutritionService>,
    pub refresher: Arc<CacheRefreshService>,
    pub occupancy: Arc<OccupancyClient>,
    pub directory: Arc<DirectoryClient>,
}

impl AppState {
    pub fn build(
        config: Arc<AggregatorConfig>,
        store: Arc<dyn CacheStore>,
        pages: Arc<dyn PageSource>,
        database: Arc<dyn FoodDatabase>,
    ) -> Self {
        let nutrition = Arc::new(NutritionService::new(
            database,
            store.clone(),
            config.nutrition_memory_capacity,
        ));
        let occupancy = Arc::new(OccupancyClient::new(pages.clone(), &config));
        let directory = Arc::new(DirectoryClient::new(pages.clone(), &config));
        let scraper = Arc::new(MenuScraper::new(pages, config.clone()));
        let refresher = Arc::new(CacheRefreshService::new(
            scraper.clone(),
            store.clone(),
            nutrition.clone(),
        ));

        Self {
            config,
            store,
            scraper,
            nutrition,
            refresher,
            occupancy,
            directory,
        }
    }
}

async fn db_connect() -> anyhow::Result<PgPool> {
    let database_url = dotenvy::var("DATABASE_URL").context("DATABASE_URL env var must be set")?;

    let db = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;

    sqlx::migrate!().run(&db).await?;

    Ok(db)
}

pub fn app(state: AppState) -> Router {
    let api_routes = Router::<AppState>::new()
        .nest("/menu", routes::menu::menu_routes())
        .nest("/occupancy", routes::occupancy::occupancy_routes())
        .nest("/directory", routes::directory::directory_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AggregatorConfig::from_env()?);
    let db = db_connect().await?;

    let store: Arc<dyn CacheStore> = Arc::new(PgCacheStore::new(db));
    let pages = Arc::new(HttpPageSource::new(config.page_timeout)?);
    let database = Arc::new(UsdaClient::new(&config)?);
    let state = AppState::build(config.clone(), store, pages, database);

    if std::env::args().any(|arg| arg == REFRESH_ONCE_FLAG) {
        let outcome = state.refresher.refresh_cache().await;
        tracing::info!(?outcome, "manual cache refresh finished");
        anyhow::ensure!(outcome.is_success(), "cache refresh failed");
        return Ok(());
    }

    state.refresher.clone().spawn_daily(config.refresh_hour);

    let port = dotenvy::var("PORT").context("PORT env var must be set")?;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
