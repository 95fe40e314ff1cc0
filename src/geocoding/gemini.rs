use crate::app_config::Gemini;
use crate::domain::Coordinates;
use crate::geocoding::gemini_wire::{
    GenerateContentRequest, GenerateContentResponse, GeocodedAddress, GeocodedPoint, address_list_schema, point_schema,
};
use crate::geocoding::{Geocoder, GeocodingError, dedup_addresses, match_echoes};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Geocoder backed by a Gemini model answering in schema-constrained JSON.
pub struct GeminiGeocoder {
    client: Client,
    url: String,
    model: String,
    configured: bool,
}

impl GeminiGeocoder {
    pub fn new(client: Client, config: &Gemini) -> Self {
        GeminiGeocoder {
            client,
            url: config.url().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            configured: config.api_key().is_some(),
        }
    }

    async fn generate<T: DeserializeOwned>(&self, prompt: String, schema: Value) -> Result<T, GeocodingError> {
        if !self.configured {
            return Err(GeocodingError::Configuration(
                "no Gemini API key, set gemini.api_key or PROXIMITY_GEMINI__API_KEY".to_string(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/v1beta/models/{}:generateContent", self.url, self.model))
            .json(&GenerateContentRequest::json(prompt, schema))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = %status, "⚠️ Gemini responded with an error");
            return Err(GeocodingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let content = serde_json::from_str::<GenerateContentResponse>(&body)
            .map_err(|e| GeocodingError::MalformedResponse(e.to_string()))?;
        let text = content
            .text()
            .ok_or_else(|| GeocodingError::MalformedResponse("response contains no text".to_string()))?;

        serde_json::from_str(text.trim()).map_err(|e| GeocodingError::MalformedResponse(format!("{}: {}", e, text)))
    }
}

#[async_trait]
impl Geocoder for GeminiGeocoder {
    #[instrument(skip(self))]
    async fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodingError> {
        debug!("🌐 Geocoding address...");
        let prompt = format!(
            "Provide the geographical coordinates (latitude and longitude) of this address: \"{}\". \
             Return null coordinates if the address cannot be found.",
            address
        );

        let point: GeocodedPoint = self.generate(prompt, point_schema()).await?;
        let coordinates = point.coordinates();
        match coordinates {
            Some(c) => debug!("🌐 Geocoding address... OK, ({}, {})", c.latitude(), c.longitude()),
            None => debug!(?point, "🌐 Geocoding address... not found"),
        }

        Ok(coordinates)
    }

    #[instrument(skip_all, fields(count = addresses.len()))]
    async fn resolve_many(&self, addresses: &[String]) -> Result<HashMap<String, Option<Coordinates>>, GeocodingError> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }

        let unique = dedup_addresses(addresses);
        debug!("🌐 Geocoding {} unique address(es)...", unique.len());

        let list = unique.iter().map(|address| format!("- {}", address)).collect::<Vec<_>>().join("\n");
        let prompt = format!(
            "Provide the geographical coordinates (latitude and longitude) of each address below. \
             Repeat every address unchanged in the \"address\" field. \
             Return null coordinates for an address that cannot be found.\n{}",
            list
        );

        let results: Vec<GeocodedAddress> = self.generate(prompt, address_list_schema()).await?;
        let resolved = match_echoes(
            addresses,
            results.into_iter().map(|result| {
                let coordinates = result.point.coordinates();
                (result.address, coordinates)
            }),
        );

        let found = resolved.values().filter(|coordinates| coordinates.is_some()).count();
        debug!("🌐 Geocoding {} unique address(es)... OK, {} resolved", unique.len(), found);

        Ok(resolved)
    }
}
