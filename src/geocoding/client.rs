use crate::app_config::AppConfig;
use reqwest::header::HeaderValue;
use reqwest::{Client, header};
use thiserror::Error;

pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Builds the HTTP client for the Gemini API. The API key header is only set when a key is configured.
pub fn new_client(config: &AppConfig) -> Result<Client, GeminiClientError> {
    let mut headers = header::HeaderMap::new();
    if let Some(api_key) = config.gemini().api_key() {
        let mut api_key_value = HeaderValue::from_str(api_key)?;
        api_key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key_value);
    }

    let client = Client::builder().timeout(config.gemini().timeout()).default_headers(headers).build()?;
    Ok(client)
}

#[derive(Error, Debug)]
pub enum GeminiClientError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Gemini client set an invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
}
