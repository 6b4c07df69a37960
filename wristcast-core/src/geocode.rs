use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    error::{FetchError, truncate_body},
    model::Coordinates,
};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
// Nominatim's usage policy requires an identifying user agent.
const USER_AGENT: &str = concat!("wristcast/", env!("CARGO_PKG_VERSION"));

/// Turns coordinates into a human-readable locality name via a
/// Nominatim-style reverse geocoder.
#[derive(Debug, Clone)]
pub struct PlaceNameResolver {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
}

impl PlaceNameResolver {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(NOMINATIM_URL)
    }

    /// Point the resolver at a different endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http, base_url: base_url.into() })
    }

    /// Resolve a locality name for `coords`, preferring the `city` field and
    /// falling back to `town`. A response carrying neither is a non-fatal
    /// gap: `Ok(None)`, and the payload encoder substitutes a placeholder.
    pub async fn resolve(&self, coords: Coordinates) -> Result<Option<String>, FetchError> {
        let url = format!("{}/reverse", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                service: "reverse geocoder",
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: ReverseResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Parse(format!("reverse geocode JSON: {e}")))?;

        let name = parsed.address.and_then(|addr| addr.city.or(addr.town));

        match &name {
            Some(city) => info!(%city, "resolved place name"),
            None => debug!("reverse geocode response had no city or town field"),
        }

        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Option<String> {
        let parsed: ReverseResponse = serde_json::from_str(body).unwrap();
        parsed.address.and_then(|addr| addr.city.or(addr.town))
    }

    #[test]
    fn city_preferred_over_town() {
        let name = parse(r#"{"address":{"city":"Delft","town":"Oude Delft"}}"#);
        assert_eq!(name.as_deref(), Some("Delft"));
    }

    #[test]
    fn town_used_when_city_absent() {
        let name = parse(r#"{"address":{"town":"Delft"}}"#);
        assert_eq!(name.as_deref(), Some("Delft"));
    }

    #[test]
    fn no_locality_fields_yields_none() {
        assert_eq!(parse(r#"{"address":{"country":"Nederland"}}"#), None);
        assert_eq!(parse(r#"{}"#), None);
    }
}
