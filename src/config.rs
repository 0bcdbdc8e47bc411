// src/config.rs
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "pktdash.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    /// Full live-data snapshot cadence.
    pub live_interval_ms: u64,
    /// Lightweight counters cadence.
    pub stats_interval_ms: u64,
    /// How long error/success banners stay up.
    pub banner_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            live_interval_ms: 5_000,
            stats_interval_ms: 2_000,
            banner_ms: 5_000,
        }
    }
}

impl PollingConfig {
    pub fn live_interval(&self) -> Duration {
        Duration::from_millis(self.live_interval_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn banner_ttl(&self) -> Duration {
        Duration::from_millis(self.banner_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: "pktdash.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but a missing file at the default location
    /// yields the built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        if path == DEFAULT_CONFIG_PATH && !Path::new(path).exists() {
            return Ok(Config::default());
        }
        Config::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.live_interval_ms == 0 {
            return Err(ConfigError::Invalid("polling.live_interval_ms must be > 0"));
        }
        if self.polling.stats_interval_ms == 0 {
            return Err(ConfigError::Invalid("polling.stats_interval_ms must be > 0"));
        }
        if self.api.base_url.is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
            [api]
            base_url = "http://10.0.0.5:8000"

            [polling]
            live_interval_ms = 10000
        "#;

        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.api.base_url, "http://10.0.0.5:8000");
        assert_eq!(cfg.polling.live_interval(), Duration::from_secs(10));
        assert_eq!(cfg.polling.stats_interval(), Duration::from_secs(2));
        assert_eq!(cfg.polling.banner_ttl(), Duration::from_secs(5));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_load_rejects_zero_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[polling]\nstats_interval_ms = 0").unwrap();

        let err = Config::load(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = Config::load_or_default("/nonexistent/pktdash.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
