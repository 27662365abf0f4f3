use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LocationListResponse {
    #[serde(default)]
    pub data: Vec<LocationSummary>,
}

#[derive(Debug, Deserialize)]
pub struct LocationSummary {
    pub id: u32,
    pub capacity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LocationReadingResponse {
    pub message: Option<String>,
    pub data: Option<LocationReading>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReading {
    pub percentage: Option<f64>,
    pub timestamp: Option<String>,
    pub is_active: Option<bool>,
}
