use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyStatus {
    #[display("available")]
    Available,
    #[display("unavailable")]
    Unavailable,
    #[display("error")]
    Error,
    #[display("closed")]
    Closed,
}

/// Point-in-time capacity reading for one location.
///
/// Numeric fields only carry meaning while `status` is [`OccupancyStatus::Available`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyRecord {
    pub location_id: u32,
    pub percentage_full: f64,
    pub capacity: Option<i64>,
    pub last_updated: DateTime<Utc>,
    pub is_active: bool,
    pub status: OccupancyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OccupancyRecord {
    pub fn unusable(
        location_id: u32,
        status: OccupancyStatus,
        capacity: Option<i64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            location_id,
            percentage_full: 0.0,
            capacity,
            last_updated: Utc::now(),
            is_active: false,
            status,
            message: Some(message.into()),
        }
    }

    pub fn is_usable(&self) -> bool {
        self.status == OccupancyStatus::Available
    }
}
