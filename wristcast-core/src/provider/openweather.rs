use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Timelike};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{FetchError, truncate_body},
    model::{Coordinates, TrendReport},
};

use super::ForecastProvider;

const OPENWEATHER_URL: &str = "https://api.openweathermap.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenWeatherMap One Call hourly forecast. Needs a configured API key.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self, FetchError> {
        Self::with_base_url(OPENWEATHER_URL, api_key)
    }

    /// Point the provider at a different endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>, api_key: String) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { api_key, http, base_url: base_url.into() })
    }
}

#[derive(Debug, Deserialize)]
struct OwResponse {
    current: OwCurrent,
    hourly: Vec<OwHour>,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwHour {
    dt: i64,
    temp: f64,
    /// Probability of precipitation, already a fraction in [0, 1].
    pop: f64,
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn supply_trends(&self, coords: Coordinates) -> Result<TrendReport, FetchError> {
        let url = format!("{}/data/3.0/onecall", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("exclude", "minutely,daily,alerts".to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                service: "OpenWeather",
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OwResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Parse(format!("OpenWeather JSON: {e}")))?;

        let first = parsed
            .hourly
            .first()
            .ok_or_else(|| FetchError::Parse("OpenWeather hourly series is empty".to_string()))?;
        let start_hour = DateTime::from_timestamp(first.dt, 0)
            .ok_or_else(|| FetchError::Parse(format!("OpenWeather hourly dt {} out of range", first.dt)))?
            .hour() as u8;

        let temp_trend: Vec<f64> = parsed.hourly.iter().map(|h| h.temp).collect();
        let precip_trend: Vec<f64> = parsed.hourly.iter().map(|h| h.pop).collect();

        debug!(start_hour, samples = temp_trend.len(), "OpenWeather trends received");

        Ok(TrendReport {
            start_hour,
            current_temp: parsed.current.temp,
            temp_trend,
            precip_trend,
        })
    }
}
