use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{error::FetchError, model::Coordinates};

/// Positioning policy for a single fetch cycle. Mirrors the options handed
/// to the host's geolocation service.
#[derive(Debug, Clone, Copy)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the sensor may return.
    pub max_cached_age: Duration,
    pub timeout: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            max_cached_age: Duration::from_secs(10),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Source of the current position. The real positioning sensor lives on the
/// host platform; implementations adapt it to the pipeline.
#[async_trait]
pub trait LocationSource: Send + Sync + std::fmt::Debug {
    /// Resolve the current coordinates. Single attempt per call, no internal
    /// retry; an error aborts the fetch cycle.
    async fn resolve(&self, options: &LocationOptions) -> Result<Coordinates, FetchError>;
}

/// Location source backed by fixed coordinates, for hosts without a
/// positioning sensor and for the CLI.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    coords: Coordinates,
}

impl FixedLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { coords: Coordinates { latitude, longitude } }
    }
}

#[async_trait]
impl LocationSource for FixedLocation {
    async fn resolve(&self, _options: &LocationOptions) -> Result<Coordinates, FetchError> {
        debug!(
            lat = self.coords.latitude,
            lon = self.coords.longitude,
            "using fixed location"
        );
        Ok(self.coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_sensor_policy() {
        let opts = LocationOptions::default();
        assert!(opts.high_accuracy);
        assert_eq!(opts.max_cached_age, Duration::from_secs(10));
        assert_eq!(opts.timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn fixed_location_returns_its_coordinates() {
        let source = FixedLocation::new(52.37, 4.9);
        let coords = source.resolve(&LocationOptions::default()).await.unwrap();
        assert_eq!(coords.latitude, 52.37);
        assert_eq!(coords.longitude, 4.9);
    }
}
