use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    error::FetchError,
    geocode::PlaceNameResolver,
    location::{LocationOptions, LocationSource},
    model::ForecastState,
    payload::{self, Payload},
    provider::ForecastProvider,
    sun::SunEventResolver,
};

/// Delivery channel to the paired device. The real watch link lives on the
/// host platform; implementations adapt it to the pipeline.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn send(&self, payload: &Payload) -> Result<(), FetchError>;
}

/// Pipeline stages, in the only order they can run. Used to tag log events
/// and aborts with where the cycle was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingLocation,
    AwaitingCityName,
    AwaitingSunEvents,
    AwaitingProviderData,
    Validating,
    Encoding,
    Delivering,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::AwaitingLocation => "awaiting-location",
            Stage::AwaitingCityName => "awaiting-city-name",
            Stage::AwaitingSunEvents => "awaiting-sun-events",
            Stage::AwaitingProviderData => "awaiting-provider-data",
            Stage::Validating => "validating",
            Stage::Encoding => "encoding",
            Stage::Delivering => "delivering",
        };
        f.write_str(name)
    }
}

/// Sequential fetch pipeline: location → place name → sun events → provider
/// trends → validate → encode → deliver.
///
/// Each stage issues one outstanding asynchronous operation and the next
/// stage only runs on its success, so no two stages ever overlap. The single
/// [`ForecastState`] lives on the stack of the in-flight call. A second
/// `fetch` while one is outstanding is rejected with
/// [`FetchError::FetchInFlight`].
#[derive(Debug)]
pub struct Pipeline {
    location: Box<dyn LocationSource>,
    geocoder: PlaceNameResolver,
    sun: SunEventResolver,
    provider: Box<dyn ForecastProvider>,
    transport: Box<dyn Transport>,
    location_options: LocationOptions,
    num_entries: usize,
    in_flight: tokio::sync::Mutex<()>,
}

impl Pipeline {
    pub fn new(
        location: Box<dyn LocationSource>,
        provider: Box<dyn ForecastProvider>,
        transport: Box<dyn Transport>,
        num_entries: usize,
    ) -> Result<Self, FetchError> {
        Ok(Self::with_resolvers(
            location,
            PlaceNameResolver::new()?,
            SunEventResolver::new()?,
            provider,
            transport,
            num_entries,
        ))
    }

    /// Assemble a pipeline with explicit resolvers (used by tests to point
    /// them at mock endpoints).
    pub fn with_resolvers(
        location: Box<dyn LocationSource>,
        geocoder: PlaceNameResolver,
        sun: SunEventResolver,
        provider: Box<dyn ForecastProvider>,
        transport: Box<dyn Transport>,
        num_entries: usize,
    ) -> Self {
        Self {
            location,
            geocoder,
            sun,
            provider,
            transport,
            location_options: LocationOptions::default(),
            num_entries,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Run one fetch cycle end to end and return the payload that was
    /// delivered. Any stage failure aborts the remaining stages; exactly one
    /// error surfaces and no partial payload is ever sent.
    pub async fn fetch(&self) -> Result<Payload, FetchError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| FetchError::FetchInFlight)?;

        debug!(stage = %Stage::AwaitingLocation, "stage entered");
        let coords = self
            .location
            .resolve(&self.location_options)
            .await
            .map_err(|e| abort(Stage::AwaitingLocation, e))?;
        info!(lat = coords.latitude, lon = coords.longitude, "location resolved");

        let mut state = ForecastState::default();

        debug!(stage = %Stage::AwaitingCityName, "stage entered");
        state.city_name = self
            .geocoder
            .resolve(coords)
            .await
            .map_err(|e| abort(Stage::AwaitingCityName, e))?;

        debug!(stage = %Stage::AwaitingSunEvents, "stage entered");
        state.sun_events = Some(
            self.sun
                .resolve(coords, Utc::now())
                .await
                .map_err(|e| abort(Stage::AwaitingSunEvents, e))?,
        );

        debug!(stage = %Stage::AwaitingProviderData, "stage entered");
        let report = self
            .provider
            .supply_trends(coords)
            .await
            .map_err(|e| abort(Stage::AwaitingProviderData, e))?;
        state.apply_trends(report);

        debug!(stage = %Stage::Validating, "stage entered");
        if !state.is_complete(self.num_entries) {
            return Err(abort(Stage::Validating, FetchError::IncompleteData));
        }

        debug!(stage = %Stage::Encoding, "stage entered");
        let payload = payload::encode(&state, self.num_entries)
            .map_err(|e| abort(Stage::Encoding, e))?;

        debug!(stage = %Stage::Delivering, "stage entered");
        self.transport
            .send(&payload)
            .await
            .map_err(|e| abort(Stage::Delivering, e))?;

        info!(city = %payload.city, start_hour = payload.temp_start, "payload delivered");
        Ok(payload)
    }
}

fn abort(stage: Stage, err: FetchError) -> FetchError {
    warn!(%stage, error = %err, "fetch aborted");
    err
}
