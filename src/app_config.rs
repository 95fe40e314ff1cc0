use config::{Config, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    core: Core,
    gemini: Gemini,
    storage: Storage,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config: AppConfig = Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("PROXIMITY").separator("__"))
            .build()?
            .try_deserialize()?;

        if config.core.result_limit == 0 {
            return Err(ConfigError::Message("core.result_limit must be at least 1".to_string()));
        }

        Ok(config)
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn gemini(&self) -> &Gemini {
        &self.gemini
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

#[derive(Debug, Deserialize)]
pub struct Core {
    store_buffer_size: usize,
    result_limit: usize,
    #[serde(default = "default_log_level")]
    log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Core {
    pub fn store_buffer_size(&self) -> usize {
        self.store_buffer_size
    }

    /// Number of nearest locations returned per query.
    pub fn result_limit(&self) -> usize {
        self.result_limit
    }

    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

#[derive(Debug, Deserialize)]
pub struct Gemini {
    url: String,
    model: String,
    api_key: Option<String>,
    #[serde(with = "humantime_serde")]
    timeout: Duration,
}

impl Gemini {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    path: String,
}

impl Storage {
    pub fn path(&self) -> &Path {
        Path::new(&self.path)
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core {
                    store_buffer_size: 1,
                    result_limit: 5,
                    log_level: default_log_level(),
                },
                gemini: Gemini {
                    url: "https://gemini.url".to_string(),
                    model: "gemini-2.5-flash".to_string(),
                    api_key: Some("key".to_string()),
                    timeout: Duration::from_secs(5),
                },
                storage: Storage {
                    path: "locations.json".to_string(),
                },
            },
        }
    }

    pub fn gemini_url(mut self, url: String) -> Self {
        self.config.gemini.url = url;
        self
    }

    pub fn gemini_api_key(mut self, api_key: Option<String>) -> Self {
        self.config.gemini.api_key = api_key;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("debug", Level::DEBUG)]
    #[case("WARN", Level::WARN)]
    #[case("nonsense", Level::INFO)]
    fn log_level_parses_the_configured_level(#[case] configured: &str, #[case] expected: Level) {
        let core = Core {
            store_buffer_size: 1,
            result_limit: 1,
            log_level: configured.to_string(),
        };

        assert_eq!(core.log_level(), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn api_key_is_absent_when_not_configured(#[case] api_key: Option<&str>) {
        let config = AppConfigBuilder::new().gemini_api_key(api_key.map(str::to_string)).build();

        assert_eq!(config.gemini().api_key(), None);
    }

    #[test]
    fn deserializes_a_toml_configuration() -> Result<(), ConfigError> {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                r#"
                [core]
                store_buffer_size = 8
                result_limit = 10

                [gemini]
                url = "https://generativelanguage.googleapis.com"
                model = "gemini-2.5-flash"
                timeout = "30s"

                [storage]
                path = "locations.json"
                "#,
                config::FileFormat::Toml,
            ))
            .build()?
            .try_deserialize()?;

        assert_eq!(config.core().store_buffer_size(), 8);
        assert_eq!(config.core().result_limit(), 10);
        assert_eq!(config.core().log_level(), Level::INFO);
        assert_eq!(config.gemini().timeout(), Duration::from_secs(30));
        assert_eq!(config.gemini().api_key(), None);
        assert_eq!(config.storage().path(), Path::new("locations.json"));
        Ok(())
    }
}
