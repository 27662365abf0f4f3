//! Live occupancy readings for the dining halls that report them.

mod occupancy_types;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use occupancy_types::{LocationListResponse, LocationReadingResponse};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::AggregatorConfig;
use crate::menu::ScrapeError;
use crate::models::occupancy::{OccupancyRecord, OccupancyStatus};
use crate::{Outcome, PageSource};

/// Dining halls with an occupancy sensor, by upstream location id.
pub const OCCUPANCY_LOCATIONS: &[(&str, u32)] =
    &[("JJ's", 839), ("Ferris", 835), ("John Jay", 840)];

const UPSTREAM_OK: &str = "OK";

#[derive(Debug, Error)]
pub enum OccupancyError {
    #[error("location {0} not found")]
    NotFound(u32),

    #[error("occupancy service answered with status {0}")]
    Upstream(u16),

    #[error("failed to reach occupancy service: {0}")]
    Fetch(#[from] ScrapeError),

    #[error("invalid occupancy payload: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct OccupancyClient {
    source: Arc<dyn PageSource>,
    api_url: String,
}

impl OccupancyClient {
    pub fn new(source: Arc<dyn PageSource>, config: &AggregatorConfig) -> Self {
        Self {
            source,
            api_url: config.occupancy_api_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Reading for a single location. An upstream "unavailable" answer becomes a closed record.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_location(
        &self,
        location_id: u32,
    ) -> Result<OccupancyRecord, OccupancyError> {
        let reading = self.fetch_reading(location_id).await?;

        Ok(match reading.into_available() {
            Some(reading) => available_record(location_id, &reading, None),
            None => {
                tracing::debug!(%location_id, "location reported as unavailable");
                OccupancyRecord::unusable(
                    location_id,
                    OccupancyStatus::Closed,
                    None,
                    "Location is closed",
                )
            }
        })
    }

    /// Readings for every known location, keyed by dining hall.
    ///
    /// A failing location only marks that entry as errored. When the capacity listing itself
    /// cannot be read every entry is errored and the outcome is a failure.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_all(&self) -> Outcome<BTreeMap<String, OccupancyRecord>> {
        let capacities = match self.fetch_capacities().await {
            Ok(capacities) => capacities,
            Err(e) => {
                tracing::error!(error = ?e, "failed to fetch base occupancy data");
                let records = OCCUPANCY_LOCATIONS
                    .iter()
                    .map(|(dining_hall, id)| {
                        let record = OccupancyRecord::unusable(
                            *id,
                            OccupancyStatus::Error,
                            None,
                            "Failed to fetch base occupancy data",
                        );
                        (dining_hall.to_string(), record)
                    })
                    .collect();
                return Outcome::failed_with(records, e.to_string());
            }
        };

        let mut records = BTreeMap::new();
        for (dining_hall, id) in OCCUPANCY_LOCATIONS {
            let capacity = capacities.get(id).copied().flatten();

            let record = match self.fetch_reading(*id).await {
                Ok(reading) => match reading.into_available() {
                    Some(reading) => available_record(*id, &reading, capacity),
                    None => OccupancyRecord::unusable(
                        *id,
                        OccupancyStatus::Unavailable,
                        capacity,
                        "Location data not available",
                    ),
                },
                Err(e) => {
                    tracing::warn!(
                        %dining_hall,
                        location_id = id,
                        error = ?e,
                        "failed to fetch occupancy"
                    );
                    OccupancyRecord::unusable(
                        *id,
                        OccupancyStatus::Error,
                        capacity,
                        "Failed to fetch occupancy data",
                    )
                }
            };

            records.insert(dining_hall.to_string(), record);
        }

        Outcome::ok(records)
    }

    async fn fetch_capacities(&self) -> Result<HashMap<u32, Option<i64>>, OccupancyError> {
        let listing: LocationListResponse = self.fetch_json(&self.api_url).await?;

        Ok(listing
            .data
            .into_iter()
            .map(|location| (location.id, location.capacity))
            .collect())
    }

    async fn fetch_reading(
        &self,
        location_id: u32,
    ) -> Result<LocationReadingResponse, OccupancyError> {
        let url = format!("{}/{location_id}", self.api_url);

        self.fetch_json(&url).await.map_err(|e| match e {
            OccupancyError::Upstream(404) => OccupancyError::NotFound(location_id),
            e => e,
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, OccupancyError> {
        let body = match self.source.fetch_page(url).await {
            Ok(body) => body,
            Err(ScrapeError::Status { status, .. }) => return Err(OccupancyError::Upstream(status)),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&body)?)
    }
}

fn available_record(
    location_id: u32,
    reading: &occupancy_types::LocationReading,
    capacity: Option<i64>,
) -> OccupancyRecord {
    let last_updated = reading
        .timestamp
        .as_deref()
        .and_then(|timestamp| DateTime::parse_from_rfc3339(timestamp).ok())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    OccupancyRecord {
        location_id,
        percentage_full: reading.percentage.unwrap_or_default().clamp(0.0, 100.0),
        capacity,
        last_updated,
        is_active: reading.is_active.unwrap_or_default(),
        status: OccupancyStatus::Available,
        message: None,
    }
}

impl LocationReadingResponse {
    fn into_available(self) -> Option<occupancy_types::LocationReading> {
        if self.message.as_deref() == Some(UPSTREAM_OK) {
            self.data
        } else {
            None
        }
    }
}
