use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("{name} must be a number")]
    InvalidNumber { name: &'static str },
}

/// Shape of `config.json`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    api_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_token: Option<String>,
    pub environment: String,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
    pub report_generator_url: String,
    pub report_generator_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// File the settings were read from, `None` when it did not exist.
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            api_token: None,
            environment: "development".to_string(),
            otel_service_name: "vector-report-api".to_string(),
            otel_exporter_endpoint: "http://localhost:4317".to_string(),
            report_generator_url: "http://127.0.0.1:8000/generate".to_string(),
            report_generator_timeout_secs: 290,
            request_timeout_secs: 300,
            source: None,
        }
    }
}

impl Config {
    /// Loads `.env`, then the JSON file named by `CONFIG_PATH`, then applies
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.json".to_string());
        let mut config = Self::from_file(Path::new(&path))?;

        if let Ok(host) = env::var("APP_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("APP_PORT") {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { name: "APP_PORT" })?;
        }
        if let Ok(token) = env::var("API_TOKEN") {
            config.api_token = Some(token);
        }

        config.environment =
            env::var("ENVIRONMENT").unwrap_or_else(|_| config.environment.clone());
        config.otel_service_name =
            env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| config.otel_service_name.clone());
        config.otel_exporter_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .unwrap_or_else(|_| config.otel_exporter_endpoint.clone());
        config.report_generator_url = env::var("REPORT_GENERATOR_URL")
            .unwrap_or_else(|_| config.report_generator_url.clone());
        config.report_generator_timeout_secs = env_number(
            "REPORT_GENERATOR_TIMEOUT_SECS",
            config.report_generator_timeout_secs,
        )?;
        config.request_timeout_secs =
            env_number("REQUEST_TIMEOUT_SECS", config.request_timeout_secs)?;
        config.clamp_generator_timeout();

        Ok(config)
    }

    /// The backend call must time out before the request-level timeout,
    /// otherwise the caller gets a bare 408 instead of the JSON error.
    fn clamp_generator_timeout(&mut self) {
        let ceiling = self.request_timeout_secs.saturating_sub(1).max(1);
        self.report_generator_timeout_secs = self.report_generator_timeout_secs.min(ceiling);
    }

    /// A missing file yields the defaults with `source` unset; a malformed
    /// one is an error.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Self {
            source: Some(path.to_path_buf()),
            ..config
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let file: FileConfig = serde_json::from_str(raw)?;
        let defaults = Self::default();

        Ok(Self {
            host: file.host.unwrap_or(defaults.host),
            port: file.port.unwrap_or(defaults.port),
            api_token: file.api_token,
            ..defaults
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn env_number(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
    }
}
