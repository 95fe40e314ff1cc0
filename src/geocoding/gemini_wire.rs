use crate::domain::Coordinates;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    pub fn json(prompt: String, response_schema: Value) -> Self {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: &'static str,
    pub response_schema: Value,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text = content.parts.iter().filter_map(|part| part.text.as_deref()).collect::<String>();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodedPoint {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl GeocodedPoint {
    /// Usable coordinates, rejecting missing, out of range and sentinel values.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.latitude?, self.longitude?)
            .ok()
            .filter(|coordinates| !coordinates.is_sentinel())
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodedAddress {
    pub address: String,
    #[serde(flatten)]
    pub point: GeocodedPoint,
}

pub fn point_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "latitude": { "type": "NUMBER", "nullable": true },
            "longitude": { "type": "NUMBER", "nullable": true }
        }
    })
}

pub fn address_list_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "address": { "type": "STRING" },
                "latitude": { "type": "NUMBER", "nullable": true },
                "longitude": { "type": "NUMBER", "nullable": true }
            },
            "required": ["address"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_serializes_to_the_generate_content_shape() -> Result<(), serde_json::Error> {
        let request = GenerateContentRequest::json("prompt".to_string(), json!({ "type": "OBJECT" }));

        assert_eq!(
            serde_json::to_value(&request)?,
            json!({
                "contents": [{ "parts": [{ "text": "prompt" }] }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": { "type": "OBJECT" }
                }
            })
        );
        Ok(())
    }

    #[test]
    fn text_joins_the_parts_of_the_first_candidate() -> Result<(), serde_json::Error> {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"latitude\": " }, { "text": "21.0}" }], "role": "model" } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))?;

        assert_eq!(response.text(), Some("{\"latitude\": 21.0}".to_string()));
        Ok(())
    }

    #[test]
    fn text_is_none_without_candidates() -> Result<(), serde_json::Error> {
        let response: GenerateContentResponse = serde_json::from_value(json!({ "promptFeedback": { "blockReason": "OTHER" } }))?;

        assert_eq!(response.text(), None);
        Ok(())
    }

    #[test]
    fn geocoded_point_rejects_unusable_values() {
        let point = |latitude, longitude| GeocodedPoint { latitude, longitude };

        assert_eq!(point(Some(21.0), Some(105.8)).coordinates(), Some(Coordinates::new(21.0, 105.8).unwrap()));
        assert_eq!(point(None, Some(105.8)).coordinates(), None);
        assert_eq!(point(Some(0.0), Some(0.0)).coordinates(), None);
        assert_eq!(point(Some(210.0), Some(105.8)).coordinates(), None);
    }
}
