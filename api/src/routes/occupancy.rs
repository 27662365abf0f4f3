use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use dining_aggregator::Outcome;
use dining_aggregator::models::occupancy::OccupancyRecord;

use super::HttpResponse;
use crate::AppState;
use crate::error::AppError;

pub fn occupancy_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(all_locations))
        .route("/{location_id}", get(single_location))
}

/// Per-location failures are reported inside the payload, never as an error status.
async fn all_locations(
    State(state): State<AppState>,
) -> Json<Outcome<BTreeMap<String, OccupancyRecord>>> {
    Json(state.occupancy.fetch_all().await)
}

async fn single_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> Result<Json<HttpResponse<OccupancyRecord>>, AppError> {
    let location_id = parse_location_id(&location_id)?;
    let record = state.occupancy.fetch_location(location_id).await?;
    Ok(Json(record.into()))
}

fn parse_location_id(raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(String::from("Invalid location ID")))
}
