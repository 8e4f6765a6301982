//! Configuration for the math tools dispatcher.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

/// How operation URLs are built from the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStyle {
    /// `{base_url}/{operation}`
    #[default]
    Flat,
    /// `{base_url}/{category}/{operation}`
    Grouped,
}

/// Connection settings, read once at startup.
///
/// The serialized form never contains the API key.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MathToolsConfig {
    /// Root URL of the computation server.
    pub base_url: String,

    /// Sent as `X-API-Key` when present.
    #[serde(serialize_with = "serialize_redacted")]
    pub api_key: Option<SecretString>,

    /// Timeout of a single attempt.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Retries after the first attempt on timeouts and connection failures.
    pub max_retries: usize,

    #[serde(with = "humantime_serde")]
    pub backoff_initial: Duration,

    #[serde(with = "humantime_serde")]
    pub backoff_max: Duration,

    pub route_style: RouteStyle,
}

impl Default for MathToolsConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            backoff_initial: default_backoff_initial(),
            backoff_max: default_backoff_max(),
            route_style: RouteStyle::default(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_max_retries() -> usize {
    3
}

fn default_backoff_initial() -> Duration {
    Duration::from_millis(100)
}

fn default_backoff_max() -> Duration {
    Duration::from_secs(2)
}

#[allow(clippy::ref_option)] // serde requires &T signature
fn serialize_redacted<S>(key: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match key {
        Some(_) => serializer.serialize_str("[REDACTED]"),
        None => serializer.serialize_none(),
    }
}

/// Configuration rejected by [`MathToolsConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base_url is required")]
    MissingBaseUrl,

    #[error("invalid_url: '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("backoff_initial ({initial:?}) must not exceed backoff_max ({max:?})")]
    InvalidBackoff { initial: Duration, max: Duration },
}

impl ConfigError {
    /// Short code shown to the user, matching the setup form error keys.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingBaseUrl | Self::InvalidUrl { .. } => "invalid_url",
            Self::ZeroTimeout => "invalid_timeout",
            Self::InvalidBackoff { .. } => "invalid_backoff",
        }
    }
}

impl MathToolsConfig {
    /// Config pointing at `base_url` with every other setting at its default.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Normalize and check the configuration.
    ///
    /// Trims whitespace and trailing slashes from `base_url`, requires an
    /// `http` or `https` URL with a host, drops a blank API key and rejects a
    /// zero timeout.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }

        let parsed = url::Url::parse(&base_url).map_err(|e| ConfigError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: base_url,
                reason: format!("scheme '{}' is not http or https", parsed.scheme()),
            });
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::InvalidUrl {
                url: base_url,
                reason: "missing host".to_owned(),
            });
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(ConfigError::InvalidUrl {
                url: base_url,
                reason: "query strings and fragments are not supported".to_owned(),
            });
        }
        self.base_url = base_url;

        if self
            .api_key
            .as_ref()
            .is_some_and(|key| key.expose_secret().trim().is_empty())
        {
            self.api_key = None;
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.backoff_initial > self.backoff_max {
            return Err(ConfigError::InvalidBackoff {
                initial: self.backoff_initial,
                max: self.backoff_max,
            });
        }

        Ok(self)
    }

    /// Whether the base URL uses plain HTTP.
    #[must_use]
    pub fn is_plain_http(&self) -> bool {
        self.base_url
            .get(..7)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http://"))
    }
}
