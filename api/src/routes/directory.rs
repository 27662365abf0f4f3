use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use super::HttpResponse;
use crate::AppState;
use crate::error::AppError;

pub fn directory_routes() -> Router<AppState> {
    Router::new().route("/user/{uni}", get(get_user))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryUser {
    first_name: String,
}

async fn get_user(
    State(state): State<AppState>,
    Path(uni): Path<String>,
) -> Result<Json<HttpResponse<DirectoryUser>>, AppError> {
    let uni = uni.trim();
    if uni.is_empty() || !uni.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::BadRequest(format!("invalid uni `{uni}`")));
    }

    let first_name = state.directory.first_name(uni).await?;
    Ok(Json(DirectoryUser { first_name }.into()))
}
