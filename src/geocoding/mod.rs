mod client;
#[cfg(test)]
pub mod fake;
mod gemini;
mod gemini_wire;

use crate::domain::Coordinates;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

pub use client::new_client;
pub use gemini::GeminiGeocoder;

/// Translates free-text addresses into coordinates.
///
/// `Ok(None)` means the service answered but could not locate the address. Degenerate (0, 0) answers are
/// reported the same way. Errors are reserved for configuration and transport failures.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodingError>;

    /// Resolves every address in one round trip. Each input string is a key of the returned map.
    async fn resolve_many(&self, addresses: &[String]) -> Result<HashMap<String, Option<Coordinates>>, GeocodingError>;
}

#[derive(Error, Debug)]
pub enum GeocodingError {
    #[error("geocoding is not configured: {0}")]
    Configuration(String),
    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("geocoding service responded with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("geocoding service returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Key used to match addresses echoed back by the service to the requested ones.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Drops addresses that normalize to one already seen, keeping the first spelling.
pub fn dedup_addresses(addresses: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    addresses
        .iter()
        .filter(|address| seen.insert(normalize_address(address)))
        .cloned()
        .collect()
}

/// Maps every requested address to the echoed result with the same normalized form, or `None`.
pub fn match_echoes(
    requested: &[String],
    echoes: impl IntoIterator<Item = (String, Option<Coordinates>)>,
) -> HashMap<String, Option<Coordinates>> {
    let mut by_key: HashMap<String, Option<Coordinates>> = HashMap::new();
    for (address, coordinates) in echoes {
        let entry = by_key.entry(normalize_address(&address)).or_insert(None);
        if entry.is_none() {
            *entry = coordinates.filter(|c| !c.is_sentinel());
        }
    }

    requested
        .iter()
        .map(|address| (address.clone(), by_key.get(&normalize_address(address)).copied().flatten()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn coordinates(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates::new(latitude, longitude).unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn dedup_addresses_removes_duplicates_ignoring_case_and_whitespace() {
        let result = dedup_addresses(&strings(&["A", "B", "A", " a ", "b"]));

        assert_eq!(result, strings(&["A", "B"]));
    }

    #[test]
    fn match_echoes_matches_altered_casing_and_whitespace() {
        let requested = strings(&["1 Dịch Vọng Hậu", "Keangnam"]);
        let echoes = vec![
            ("  1 dịch vọng hậu ".to_string(), Some(coordinates(21.03, 105.78))),
            ("KEANGNAM".to_string(), Some(coordinates(21.01, 105.78))),
        ];

        let result = match_echoes(&requested, echoes);

        assert_eq!(result.len(), 2);
        assert_eq!(result["1 Dịch Vọng Hậu"], Some(coordinates(21.03, 105.78)));
        assert_eq!(result["Keangnam"], Some(coordinates(21.01, 105.78)));
    }

    #[test]
    fn match_echoes_maps_missing_echoes_to_none() {
        let requested = strings(&["A", "B"]);

        let result = match_echoes(&requested, vec![("a".to_string(), Some(coordinates(1.0, 1.0)))]);

        assert_eq!(result["A"], Some(coordinates(1.0, 1.0)));
        assert_eq!(result["B"], None);
    }

    #[test]
    fn match_echoes_resolves_duplicate_requests_identically() {
        let requested = strings(&["A", "B", "A"]);

        let result = match_echoes(
            &requested,
            vec![("A".to_string(), Some(coordinates(1.0, 2.0))), ("B".to_string(), None)],
        );

        assert_eq!(result.len(), 2);
        assert_eq!(result["A"], Some(coordinates(1.0, 2.0)));
        assert_eq!(result["B"], None);
    }

    #[test]
    fn match_echoes_treats_the_sentinel_as_not_found() {
        let requested = strings(&["A"]);

        let result = match_echoes(&requested, vec![("A".to_string(), Some(coordinates(0.0, 0.0)))]);

        assert_eq!(result["A"], None);
    }
}
