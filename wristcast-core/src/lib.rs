//! Core library for the `wristcast` watch companion.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The sequential fetch pipeline (location → place name → sun events →
//!   forecast trends → validate → encode → deliver)
//! - Abstraction over forecast providers and the device transport
//! - The fixed-layout payload sent to the paired watch
//!
//! It is used by `wristcast-cli`, but can also be reused by other binaries
//! or host shims.

pub mod config;
pub mod error;
pub mod geocode;
pub mod location;
pub mod model;
pub mod payload;
pub mod pipeline;
pub mod provider;
pub mod sun;

pub use config::{Config, FallbackLocation, ProviderConfig};
pub use error::FetchError;
pub use geocode::PlaceNameResolver;
pub use location::{FixedLocation, LocationOptions, LocationSource};
pub use model::{Coordinates, ForecastState, SunEvent, SunEventKind, TrendReport};
pub use payload::{CITY_PLACEHOLDER, Payload};
pub use pipeline::{Pipeline, Stage, Transport};
pub use provider::{ForecastProvider, ProviderId};
pub use sun::SunEventResolver;
