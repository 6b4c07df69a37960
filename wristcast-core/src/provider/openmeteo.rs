use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{FetchError, truncate_body},
    model::{Coordinates, TrendReport},
};

use super::ForecastProvider;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Open-Meteo hourly forecast (<https://open-meteo.com>). Keyless.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    base_url: String,
    num_entries: usize,
}

impl OpenMeteoProvider {
    pub fn new(num_entries: usize) -> Result<Self, FetchError> {
        Self::with_base_url(OPEN_METEO_URL, num_entries)
    }

    /// Point the provider at a different endpoint (used by tests).
    pub fn with_base_url(
        base_url: impl Into<String>,
        num_entries: usize,
    ) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, base_url: base_url.into(), num_entries })
    }
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current: OmCurrent,
    hourly: OmHourly,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    /// Integer percentages in [0, 100].
    precipitation_probability: Vec<f64>,
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn supply_trends(&self, coords: Coordinates) -> Result<TrendReport, FetchError> {
        let url = format!("{}/v1/forecast", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("current", "temperature_2m".to_string()),
                (
                    "hourly",
                    "temperature_2m,precipitation_probability".to_string(),
                ),
                ("forecast_hours", self.num_entries.to_string()),
                // `auto` makes Open-Meteo resolve the timezone from the
                // coordinates, so hourly slots (and the start hour derived
                // from them) are in the local time the watch displays.
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                service: "Open-Meteo",
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OmResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Parse(format!("Open-Meteo JSON: {e}")))?;

        let first_slot = parsed
            .hourly
            .time
            .first()
            .ok_or_else(|| FetchError::Parse("Open-Meteo hourly series is empty".to_string()))?;
        let start_hour = parse_start_hour(first_slot)?;

        let precip_trend = parsed
            .hourly
            .precipitation_probability
            .iter()
            .map(|pct| pct / 100.0)
            .collect::<Vec<_>>();

        debug!(
            start_hour,
            samples = parsed.hourly.temperature_2m.len(),
            "Open-Meteo trends received"
        );

        Ok(TrendReport {
            start_hour,
            current_temp: parsed.current.temperature_2m,
            temp_trend: parsed.hourly.temperature_2m,
            precip_trend,
        })
    }
}

/// Open-Meteo hourly slots look like `2026-03-01T13:00`, local to the
/// requested coordinates.
fn parse_start_hour(slot: &str) -> Result<u8, FetchError> {
    let parsed = NaiveDateTime::parse_from_str(slot, "%Y-%m-%dT%H:%M")
        .map_err(|e| FetchError::Parse(format!("Open-Meteo hourly time '{slot}': {e}")))?;
    Ok(parsed.hour() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_hour_parsed_from_hourly_slot() {
        assert_eq!(parse_start_hour("2026-03-01T13:00").unwrap(), 13);
        assert_eq!(parse_start_hour("2026-03-01T00:00").unwrap(), 0);
    }

    #[test]
    fn malformed_slot_is_a_parse_error() {
        let err = parse_start_hour("13:00").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
