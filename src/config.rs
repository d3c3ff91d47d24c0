use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, ThingsError};

/// Which store concepts are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Neo4j,
    ConceptsApi,
}

#[allow(clippy::should_implement_trait)]
impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Neo4j => "neo4j",
            Backend::ConceptsApi => "concepts-api",
        }
    }

    /// Parses a backend name, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<Backend> {
        match s {
            "neo4j" => Some(Backend::Neo4j),
            "concepts-api" => Some(Backend::ConceptsApi),
            _ => None,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

/// Configuration for the things service.
///
/// Loaded from an optional TOML file; command-line flags and environment
/// variables override individual values afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThingsConfig {
    /// Port the HTTP server listens on.
    pub app_port: u16,
    /// Store concepts are read from.
    pub backend: Backend,
    /// Base URL of the Neo4j HTTP endpoint.
    pub neo_url: String,
    /// Neo4j database name.
    pub neo_database: String,
    pub neo_user: Option<String>,
    pub neo_password: Option<String>,
    /// Base URL of the upstream concept service.
    pub concepts_api_url: String,
    /// Deployment environment; `test` switches API URLs to the test host.
    pub env: String,
    /// `max-age` of successful responses, in seconds.
    pub cache_max_age_secs: u64,
    /// Timeout for each outbound request, in seconds.
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ThingsConfig {
    fn default() -> Self {
        Self {
            app_port: 8080,
            backend: Backend::Neo4j,
            neo_url: "http://localhost:7474".to_string(),
            neo_database: "neo4j".to_string(),
            neo_user: None,
            neo_password: None,
            concepts_api_url: "http://localhost:8080".to_string(),
            env: "local".to_string(),
            cache_max_age_secs: 30,
            request_timeout_secs: 60,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl ThingsConfig {
    /// Value of the `Cache-Control` header sent with successful lookups.
    pub fn cache_control_header(&self) -> String {
        format!("max-age={}, public", self.cache_max_age_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Neo4j credentials, when both user and password are set.
    pub fn neo_credentials(&self) -> Option<(&str, &str)> {
        match (&self.neo_user, &self.neo_password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// Checks that the URL of the selected backend is usable.
    pub fn validate(&self) -> Result<()> {
        let (name, url) = match self.backend {
            Backend::Neo4j => ("neo_url", &self.neo_url),
            Backend::ConceptsApi => ("concepts_api_url", &self.concepts_api_url),
        };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ThingsError::Config {
                message: format!("{} must be an http(s) URL, got '{}'", name, url),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ThingsError::Config {
                message: "request_timeout_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads the configuration from a TOML file.
///
/// If the file does not exist, returns the default configuration.
pub fn load_config(path: &Path) -> Result<ThingsConfig> {
    if !path.exists() {
        return Ok(ThingsConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| ThingsError::Config {
        message: format!("failed to read config file '{}': {}", path.display(), e),
    })?;

    let config: ThingsConfig = toml::from_str(&contents).map_err(|e| ThingsError::Config {
        message: format!("failed to parse config file '{}': {}", path.display(), e),
    })?;

    Ok(config)
}

/// Parses a duration such as `30s`, `90m` or `2h45m` into whole seconds.
///
/// Units are `h`, `m`, `s`, `ms`, `us` (or `µs`) and `ns`; components may be
/// fractional and are summed. A bare `0` is accepted.
pub fn parse_duration_secs(text: &str) -> Result<u64> {
    let invalid = || ThingsError::Config {
        message: format!(
            "invalid duration '{}', expected a value such as 30s or 2h45m",
            text
        ),
    };
    let trimmed = text.trim();
    if trimmed == "0" {
        return Ok(0);
    }
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total = 0.0_f64;
    let mut rest = trimmed;
    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        let unit_end = rest[number_len..]
            .find(is_number)
            .map_or(rest.len(), |i| number_len + i);
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        let scale = match &rest[number_len..unit_end] {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 1e-3,
            "us" | "µs" => 1e-6,
            "ns" => 1e-9,
            _ => return Err(invalid()),
        };
        total += value * scale;
        rest = &rest[unit_end..];
    }
    Ok(total as u64)
}
