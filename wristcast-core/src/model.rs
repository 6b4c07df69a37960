use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic position produced once per fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SunEventKind {
    Sunrise,
    Sunset,
}

impl std::fmt::Display for SunEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SunEventKind::Sunrise => f.write_str("sunrise"),
            SunEventKind::Sunset => f.write_str("sunset"),
        }
    }
}

/// A single sunrise or sunset occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunEvent {
    pub kind: SunEventKind,
    pub at: DateTime<Utc>,
}

/// What a forecast provider supplies for one cycle: the hour-of-day the
/// trend series starts at, the current temperature in °C, and two
/// same-length hourly series (temperature in °C, precipitation probability
/// as a fraction in [0, 1]).
#[derive(Debug, Clone)]
pub struct TrendReport {
    pub start_hour: u8,
    pub current_temp: f64,
    pub temp_trend: Vec<f64>,
    pub precip_trend: Vec<f64>,
}

/// Accumulator mutated by the pipeline stages. Every field starts absent and
/// is set exactly once per cycle by the stage that owns it.
///
/// `city_name` is deliberately not part of the completeness check: a missing
/// locality is substituted with a placeholder at encode time rather than
/// aborting the fetch.
#[derive(Debug, Clone, Default)]
pub struct ForecastState {
    pub city_name: Option<String>,
    pub sun_events: Option<[SunEvent; 2]>,
    pub start_hour: Option<u8>,
    pub current_temp: Option<f64>,
    pub temp_trend: Option<Vec<f64>>,
    pub precip_trend: Option<Vec<f64>>,
}

impl ForecastState {
    /// Record the provider's trend report, setting the four provider-owned
    /// fields in one step.
    pub fn apply_trends(&mut self, report: TrendReport) {
        self.start_hour = Some(report.start_hour);
        self.current_temp = Some(report.current_temp);
        self.temp_trend = Some(report.temp_trend);
        self.precip_trend = Some(report.precip_trend);
    }

    /// Pure completeness predicate: the five required fields are present and
    /// both trend series hold at least `num_entries` samples.
    pub fn is_complete(&self, num_entries: usize) -> bool {
        let trends_filled = matches!(&self.temp_trend, Some(t) if t.len() >= num_entries)
            && matches!(&self.precip_trend, Some(p) if p.len() >= num_entries);

        self.sun_events.is_some()
            && self.start_hour.is_some()
            && self.current_temp.is_some()
            && trends_filled
    }
}
