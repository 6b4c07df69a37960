use anyhow::{Context, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};

use wristcast_core::{
    Config, FetchError, FixedLocation, Payload, Pipeline, ProviderId, Transport,
    provider::{default_provider_from_config, provider_from_config},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wristcast", version, about = "Watch companion forecast fetcher")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openmeteo" or "openweather".
        provider: String,
    },

    /// Run one fetch cycle and print the payload instead of sending it.
    Fetch {
        /// Latitude; falls back to `fallback_location` from the config file.
        #[arg(long)]
        lat: Option<f64>,

        /// Longitude; falls back to `fallback_location` from the config file.
        #[arg(long)]
        lon: Option<f64>,

        /// Provider to use for this cycle instead of the configured default.
        #[arg(long)]
        provider: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Fetch { lat, lon, provider } => fetch(lat, lon, provider.as_deref()).await,
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    if !id.requires_api_key() {
        println!("Provider '{id}' needs no API key; setting it as the default.");
        let mut cfg = Config::load()?;
        cfg.set_default_provider(id);
        cfg.save()?;
        return Ok(());
    }

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let mut cfg = Config::load()?;
    cfg.upsert_provider_api_key(id, api_key.trim().to_string());
    cfg.save()?;

    println!("Saved API key for '{id}' to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn fetch(lat: Option<f64>, lon: Option<f64>, provider: Option<&str>) -> anyhow::Result<()> {
    let cfg = Config::load()?;

    let (latitude, longitude) = match (lat, lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        (None, None) => {
            let loc = cfg.fallback_location.ok_or_else(|| {
                anyhow::anyhow!(
                    "No coordinates given and no fallback_location configured.\n\
                     Hint: pass --lat and --lon, or add a [fallback_location] section to {}.",
                    Config::config_file_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| "the config file".to_string())
                )
            })?;
            (loc.latitude, loc.longitude)
        }
        _ => bail!("--lat and --lon must be given together"),
    };

    let provider = match provider {
        Some(name) => provider_from_config(ProviderId::try_from(name)?, &cfg)?,
        None => default_provider_from_config(&cfg)?,
    };

    let pipeline = Pipeline::new(
        Box::new(FixedLocation::new(latitude, longitude)),
        provider,
        Box::new(ConsoleTransport),
        cfg.num_entries,
    )?;

    pipeline.fetch().await?;
    Ok(())
}

/// Prints the payload as JSON instead of sending it to a watch, so the wire
/// content can be inspected from a terminal.
#[derive(Debug)]
struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send(&self, payload: &Payload) -> Result<(), FetchError> {
        let json = serde_json::to_string_pretty(payload)
            .map_err(|e| FetchError::Delivery(e.to_string()))?;
        println!("{json}");
        Ok(())
    }
}
