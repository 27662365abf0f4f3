use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod directory;
pub mod menu;
pub mod occupancy;

#[derive(Serialize)]
pub struct HttpResponse<B> {
    success: bool,
    data: B,
    timestamp: DateTime<Utc>,
}

impl<B> From<B> for HttpResponse<B> {
    fn from(data: B) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }
}
