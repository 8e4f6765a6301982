//! Layered configuration loading.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use math_tools::MathToolsConfig;
use serde_json::{Map, Value};

/// Prefix of the environment variables read into the configuration.
pub const ENV_PREFIX: &str = "MATH_TOOLS_";

// `api_key` is read separately: figment would turn an all-digit key into a
// number.
const ENV_KEYS: [&str; 6] = [
    "base_url",
    "timeout",
    "max_retries",
    "backoff_initial",
    "backoff_max",
    "route_style",
];

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub max_retries: Option<usize>,
}

impl Overrides {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(url) = &self.base_url {
            map.insert("base_url".to_owned(), Value::from(url.as_str()));
        }
        if let Some(timeout) = self.timeout {
            map.insert(
                "timeout".to_owned(),
                Value::from(humantime::format_duration(timeout).to_string()),
            );
        }
        if let Some(retries) = self.max_retries {
            map.insert("max_retries".to_owned(), Value::from(retries));
        }
        Value::Object(map)
    }
}

/// Load and validate the configuration.
///
/// Layers: defaults, then the YAML file (if given), then `MATH_TOOLS_*`
/// environment variables, then command-line overrides.
///
/// # Errors
/// Fails if the file is missing or malformed, a value has the wrong type, or
/// the result does not validate.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<MathToolsConfig> {
    let mut figment = Figment::new();

    if let Some(path) = path {
        if !path.is_file() {
            bail!("config file does not exist: {}", path.display());
        }
        figment = figment.merge(Yaml::file(path));
    }

    let mut figment = figment.merge(Env::prefixed(ENV_PREFIX).only(&ENV_KEYS));
    if let Ok(key) = std::env::var(format!("{ENV_PREFIX}API_KEY")) {
        figment = figment.merge(Serialized::default("api_key", key));
    }
    let figment = figment.merge(Serialized::defaults(overrides.to_json()));

    let config: MathToolsConfig = figment
        .extract()
        .context("failed to read configuration")?;

    let config = config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration ({}): {e}", e.code()))?;

    tracing::debug!(
        base_url = %config.base_url,
        timeout = ?config.timeout,
        max_retries = config.max_retries,
        "configuration loaded"
    );
    Ok(config)
}
