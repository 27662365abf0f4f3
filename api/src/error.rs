use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use dining_aggregator::occupancy::OccupancyError;
use dining_aggregator::store::StoreError;
use serde::Serialize;
use thiserror::Error;

use crate::services::directory::DirectoryError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Something went wrong: {0}")]
    ServerError(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    status: u16,
    #[serde(rename = "statusText")]
    status_text: String,
    timestamp: DateTime<Utc>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let code = self.error_code();

        let body = Json(ErrorBody {
            success: false,
            error: self.to_string(),
            status: code.as_u16(),
            status_text: code.canonical_reason().unwrap_or_default().to_string(),
            timestamp: Utc::now(),
        });

        (code, body).into_response()
    }
}

impl AppError {
    fn error_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::ServerError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::ServerError(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::ServerError(err.to_string())
    }
}

impl From<OccupancyError> for AppError {
    fn from(err: OccupancyError) -> Self {
        match err {
            OccupancyError::NotFound(_) => AppError::NotFound(err.to_string()),
            _ => AppError::ServerError(err.to_string()),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(_) => AppError::NotFound(err.to_string()),
            _ => AppError::ServerError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn errors_render_the_failure_shape() {
        let error = AppError::BadRequest(String::from("Invalid location ID"));
        let (status, body) = body_of(error).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid location ID");
        assert_eq!(body["status"], 400);
        assert_eq!(body["statusText"], "Bad Request");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn missing_upstream_location_is_not_found() {
        let (status, body) = body_of(OccupancyError::NotFound(999).into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "location 999 not found");

        let (status, _) = body_of(OccupancyError::Upstream(502).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
