use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{FetchError, truncate_body},
    model::{Coordinates, SunEvent, SunEventKind},
};

const SUNRISE_SUNSET_URL: &str = "https://api.sunrise-sunset.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves the next two sun events for a position by querying a
/// sunrise-sunset API for today and tomorrow and merging the results.
#[derive(Debug, Clone)]
pub struct SunEventResolver {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SunApiResponse {
    results: SunApiResults,
}

#[derive(Debug, Deserialize)]
struct SunApiResults {
    sunrise: DateTime<Utc>,
    sunset: DateTime<Utc>,
}

impl SunEventResolver {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(SUNRISE_SUNSET_URL)
    }

    /// Point the resolver at a different endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, base_url: base_url.into() })
    }

    /// Fetch today's and tomorrow's sunrise/sunset, then return the first
    /// two events strictly after `reference`, ascending in time.
    ///
    /// Fewer than two future events in the two-day window (possible very
    /// late on the second day) is reported as
    /// [`FetchError::InsufficientSunData`] instead of a short result.
    pub async fn resolve(
        &self,
        coords: Coordinates,
        reference: DateTime<Utc>,
    ) -> Result<[SunEvent; 2], FetchError> {
        let today = self.fetch_day(coords, false).await?;
        let tomorrow = self.fetch_day(coords, true).await?;

        let merged = today.into_iter().chain(tomorrow).collect();
        let next = next_sun_events(merged, reference)?;

        for event in &next {
            info!(kind = %event.kind, at = %event.at, "next sun event");
        }

        Ok(next)
    }

    async fn fetch_day(
        &self,
        coords: Coordinates,
        tomorrow: bool,
    ) -> Result<[SunEvent; 2], FetchError> {
        let url = format!("{}/json", self.base_url);

        let mut query = vec![
            ("lat", coords.latitude.to_string()),
            ("lng", coords.longitude.to_string()),
            ("formatted", "0".to_string()),
        ];
        if tomorrow {
            query.push(("date", "tomorrow".to_string()));
        }

        let res = self.http.get(&url).query(&query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                service: "sunrise-sunset API",
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: SunApiResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Parse(format!("sunrise-sunset JSON: {e}")))?;

        Ok([
            SunEvent { kind: SunEventKind::Sunrise, at: parsed.results.sunrise },
            SunEvent { kind: SunEventKind::Sunset, at: parsed.results.sunset },
        ])
    }
}

/// Pure merge step: keep events strictly after `reference`, sort ascending,
/// take the first two.
pub fn next_sun_events(
    mut events: Vec<SunEvent>,
    reference: DateTime<Utc>,
) -> Result<[SunEvent; 2], FetchError> {
    events.retain(|event| event.at > reference);
    events.sort_by_key(|event| event.at);

    match (events.first(), events.get(1)) {
        (Some(first), Some(second)) => Ok([*first, *second]),
        _ => Err(FetchError::InsufficientSunData),
    }
}
