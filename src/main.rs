use crate::app_config::AppConfig;
use crate::geocoding::GeminiGeocoder;
use crate::location_collection::LocationCollection;
use crate::repository::{JsonFileRepository, load_or_seed};
use crate::store::spawn_store;
use std::sync::Arc;
use tracing::{info, warn};

mod app_config;
mod console;
mod coordinates_deserializer;
mod distance;
mod domain;
mod geocoding;
mod location_collection;
mod ranking;
mod repository;
mod store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_max_level(config.core().log_level())
        .with_writer(std::io::stderr)
        .init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!("✅  Loaded configuration");

    let repository = Arc::new(JsonFileRepository::new(config.storage().path()));
    let locations = load_or_seed(repository.as_ref()).await;
    info!("✅  Loaded {} location(s) from {}", locations.len(), repository.path().display());

    let store = spawn_store(LocationCollection::new(locations), repository, config.core().store_buffer_size());
    info!("✅  Initialized store");

    let gemini_client = geocoding::new_client(&config)?;
    let geocoder = GeminiGeocoder::new(gemini_client, config.gemini());
    if config.gemini().api_key().is_none() {
        warn!("⚠️ No Gemini API key configured, address lookups will fail");
    }
    info!("✅  Initialized geocoder using {}", config.gemini().model());

    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));

    console::run(&geocoder, &store, config.core().result_limit()).await?;

    info!("👋 Shutting down");
    Ok(())
}
