//! Application configuration management.
//!
//! Configuration is read once at startup from environment variables (a
//! `.env` file is honoured when present). Missing or invalid values are
//! reported as [`ConfigError`] before the server binds.
//!
//! # Environment Variables
//!
//! - `HOST`: bind address (default `0.0.0.0`)
//! - `PORT`: bind port (default `3000`)
//! - `JWT_SECRET`: HS256 secret for bearer tokens (required)
//! - `BASE_URL`: prefix for `links.self` and `Location` (default empty)
//! - `CONDITIONAL_DELETE`: route DELETE through the write preconditions
//!   (default `false`)
//! - `LOG_FORMAT`: `pretty` (default) or `json`

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("expected `pretty` or `json`, got `{value}`")),
        }
    }
}

/// Application configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Prefix for absolute links, without a trailing slash.
    pub base_url: String,
    /// When set, DELETE must be conditional like PATCH and PUT.
    pub conditional_delete: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `JWT_SECRET` is not set, and
    /// `ConfigError::InvalidValue` if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors if file doesn't exist)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?;

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_optional(&lookup, "PORT", 3000)?,
            jwt_secret,
            base_url: lookup("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            conditional_delete: parse_optional(&lookup, "CONDITIONAL_DELETE", false)?,
            log_format: parse_optional(&lookup, "LOG_FORMAT", LogFormat::default())?,
        })
    }

    /// Configuration with defaults and the given secret.
    #[must_use]
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            jwt_secret: jwt_secret.into(),
            base_url: String::new(),
            conditional_delete: false,
            log_format: LogFormat::Pretty,
        }
    }

    #[must_use]
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_conditional_delete(self, conditional_delete: bool) -> Self {
        Self {
            conditional_delete,
            ..self
        }
    }

    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("conditional_delete", &self.conditional_delete)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Parses an optional variable, falling back to `default` when unset.
fn parse_optional<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |value| {
        value.trim().parse().map_err(|error: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: error.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use rstest::rstest;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        AppConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[rstest]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("JWT_SECRET", "secret")]).unwrap();

        assert_eq!(config, AppConfig::with_secret("secret"));
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[rstest]
    #[case(&[])]
    #[case(&[("JWT_SECRET", "")])]
    fn secret_is_required(#[case] pairs: &[(&str, &str)]) {
        assert_eq!(
            load(pairs),
            Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
        );
    }

    #[rstest]
    fn every_variable_is_read() {
        let config = load(&[
            ("JWT_SECRET", "secret"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("BASE_URL", "https://api.example.com/"),
            ("CONDITIONAL_DELETE", "true"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.base_url, "https://api.example.com");
        assert!(config.conditional_delete);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[rstest]
    #[case("PORT", "eighty")]
    #[case("PORT", "70000")]
    #[case("CONDITIONAL_DELETE", "yes")]
    #[case("LOG_FORMAT", "xml")]
    fn invalid_values_are_reported(#[case] key: &str, #[case] value: &str) {
        let result = load(&[("JWT_SECRET", "secret"), (key, value)]);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: reported, .. }) if reported == key
        ));
    }

    #[rstest]
    fn debug_output_hides_the_secret() {
        let rendered = format!("{:?}", AppConfig::with_secret("hunter2"));

        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
