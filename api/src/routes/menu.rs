use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use dining_aggregator::models::menu_items::MenuData;
use dining_aggregator::nutrition::MealAnalysis;
use dining_aggregator::recommend::{
    DataStatus, DiningHallScore, Recommendations, ScoredMeal, recommend,
};
use dining_aggregator::refresh::RefreshOutcome;
use serde::{Deserialize, Serialize};

use super::HttpResponse;
use crate::AppState;
use crate::error::AppError;
use crate::handlers::menu::{MenuOrigin, cached_meals, load_menu};

pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_menu))
        .route("/recommend", get(get_recommendations))
        .route("/analyze", get(analyze_meal))
        .route("/refresh", post(refresh_menu))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MenuResponse {
    success: bool,
    data: MenuData,
    recommendations: Recommendations,
    source: MenuOrigin,
    last_updated: Option<DateTime<Utc>>,
    timestamp: DateTime<Utc>,
}

async fn get_menu(State(state): State<AppState>) -> Result<Json<MenuResponse>, AppError> {
    let loaded = load_menu(&state).await?;

    Ok(Json(MenuResponse {
        success: true,
        recommendations: recommend(&loaded.meals),
        data: loaded.menu,
        source: loaded.origin,
        last_updated: loaded.last_updated,
        timestamp: Utc::now(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationData {
    status: DataStatus,
    recommendations: Vec<DiningHallScore>,
    recommended_dining_hall: Option<String>,
    processed_meals: Vec<ScoredMeal>,
}

async fn get_recommendations(
    State(state): State<AppState>,
) -> Result<Json<HttpResponse<RecommendationData>>, AppError> {
    let meals = cached_meals(&state).await?;
    let Recommendations {
        status,
        by_dining_hall,
        recommended_dining_hall,
        ..
    } = recommend(&meals);

    Ok(Json(
        RecommendationData {
            status,
            recommendations: by_dining_hall,
            recommended_dining_hall,
            processed_meals: meals,
        }
        .into(),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeParams {
    food_name: String,
    dining_hall: String,
}

async fn analyze_meal(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<HttpResponse<MealAnalysis>>, AppError> {
    let food_name = params.food_name.trim();
    let dining_hall = params.dining_hall.trim();
    if food_name.is_empty() || dining_hall.is_empty() {
        return Err(AppError::BadRequest(String::from("foodName and diningHall are required")));
    }

    let analysis = state.nutrition.analyze_meal(food_name, dining_hall).await;
    Ok(Json(analysis.into()))
}

async fn refresh_menu(
    State(state): State<AppState>,
) -> Result<Json<HttpResponse<RefreshOutcome>>, AppError> {
    match state.refresher.refresh_cache().await {
        RefreshOutcome::Failed { error } => Err(AppError::ServerError(error)),
        outcome => Ok(Json(outcome.into())),
    }
}
