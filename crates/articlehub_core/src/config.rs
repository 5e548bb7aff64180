//! Environment configuration and backend mode selection.
//!
//! # Responsibility
//! - Read endpoint, access key, demo store path and log level from the environment.
//! - Decide once whether the app runs against the remote backend or in demo mode.
//!
//! # Invariants
//! - Remote mode requires both endpoint URL and access key to be non-blank.
//! - The access key never appears in `Debug` output.

use crate::logging::{default_log_level, normalize_level};
use reqwest::Url;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

pub const ENV_BACKEND_URL: &str = "ARTICLEHUB_BACKEND_URL";
pub const ENV_ACCESS_KEY: &str = "ARTICLEHUB_ACCESS_KEY";
pub const ENV_DEMO_DB: &str = "ARTICLEHUB_DEMO_DB";
pub const ENV_LOG_LEVEL: &str = "ARTICLEHUB_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBackendUrl(String),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBackendUrl(details) => write!(f, "invalid backend url: {details}"),
            Self::InvalidLogLevel(details) => write!(f, "{details}"),
        }
    }
}

impl Error for ConfigError {}

/// Base URL plus access key of the hosted backend.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    base_url: Url,
    access_key: String,
}

impl BackendEndpoint {
    /// Parses `base_url`; a trailing slash is added so relative joins keep the path.
    pub fn new(base_url: &str, access_key: impl Into<String>) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim();
        let with_slash = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let parsed = Url::parse(&with_slash)
            .map_err(|err| ConfigError::InvalidBackendUrl(format!("`{trimmed}`: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBackendUrl(format!(
                "`{trimmed}`: scheme must be http or https"
            )));
        }
        Ok(Self {
            base_url: parsed,
            access_key: access_key.into().trim().to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn access_key(&self) -> &str {
        self.access_key.as_str()
    }

    /// Resolves a path relative to the base URL.
    pub fn join(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url
            .join(path)
            .map_err(|err| ConfigError::InvalidBackendUrl(format!("`{path}`: {err}")))
    }
}

impl Debug for BackendEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendEndpoint")
            .field("base_url", &self.base_url.as_str())
            .field("access_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    Demo,
    Remote(BackendEndpoint),
}

impl BackendMode {
    pub fn is_demo(&self) -> bool {
        matches!(self, Self::Demo)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendMode,
    /// File path for the demo store; `None` keeps it in memory.
    pub demo_db_path: Option<PathBuf>,
    pub log_level: &'static str,
}

impl AppConfig {
    /// Demo mode with an in-memory store.
    pub fn demo() -> Self {
        Self {
            backend: BackendMode::Demo,
            demo_db_path: None,
            log_level: default_log_level(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match (non_blank(ENV_BACKEND_URL), non_blank(ENV_ACCESS_KEY)) {
            (Some(url), Some(key)) => BackendMode::Remote(BackendEndpoint::new(&url, key)?),
            _ => BackendMode::Demo,
        };
        let log_level = match non_blank(ENV_LOG_LEVEL) {
            Some(level) => normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        Ok(Self {
            backend,
            demo_db_path: non_blank(ENV_DEMO_DB).map(|value| PathBuf::from(value.trim())),
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, BackendEndpoint, BackendMode, ConfigError};
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_either_value_forces_demo_mode() {
        let only_url = AppConfig::from_lookup(lookup(&[(
            "ARTICLEHUB_BACKEND_URL",
            "https://db.example.com",
        )]))
        .unwrap();
        assert!(only_url.backend.is_demo());

        let blank_key = AppConfig::from_lookup(lookup(&[
            ("ARTICLEHUB_BACKEND_URL", "https://db.example.com"),
            ("ARTICLEHUB_ACCESS_KEY", "   "),
        ]))
        .unwrap();
        assert!(blank_key.backend.is_demo());
    }

    #[test]
    fn both_values_select_remote_mode() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ARTICLEHUB_BACKEND_URL", "https://db.example.com/base"),
            ("ARTICLEHUB_ACCESS_KEY", "anon-key"),
            ("ARTICLEHUB_LOG_LEVEL", "WARNING"),
        ]))
        .unwrap();
        let BackendMode::Remote(endpoint) = config.backend else {
            panic!("expected remote mode");
        };
        assert_eq!(endpoint.access_key(), "anon-key");
        assert_eq!(
            endpoint.join("rest/v1/articles").unwrap().as_str(),
            "https://db.example.com/base/rest/v1/articles"
        );
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn unparsable_url_is_a_config_error() {
        let err = AppConfig::from_lookup(lookup(&[
            ("ARTICLEHUB_BACKEND_URL", "not a url"),
            ("ARTICLEHUB_ACCESS_KEY", "k"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackendUrl(_)));

        let err = BackendEndpoint::new("ftp://db.example.com", "k").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackendUrl(_)));
    }

    #[test]
    fn debug_redacts_access_key() {
        let endpoint = BackendEndpoint::new("https://db.example.com", "secret-key").unwrap();
        assert!(!format!("{endpoint:?}").contains("secret-key"));
    }
}
