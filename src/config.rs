use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Serialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct GithubConfig {
    /// Base URL of the REST API (GitHub Enterprise: https://<host>/api/v3)
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq)]
pub struct FetchConfig {
    /// Maximum commit fetches in flight (unlimited when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel_fetches: Option<usize>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Config {
    /// Load the config file, falling back to defaults when it doesn't exist,
    /// then apply `key.path=value` overrides
    pub fn load(path: &str, overrides: &[String]) -> anyhow::Result<Self> {
        let mut value = if Path::new(path).exists() {
            let content =
                fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
            toml::from_str::<toml::Table>(&content)
                .with_context(|| format!("Failed to parse {}", path))?
        } else {
            debug!("Config file {} not found, using defaults", path);
            toml::Table::new()
        };

        for entry in overrides {
            apply_override(&mut value, entry)?;
        }

        let config: Self = toml::Value::Table(value)
            .try_into()
            .with_context(|| format!("Invalid config in {}", path))?;
        debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Set a dot-notation key, e.g. `fetch.max_parallel_fetches=4`
///
/// The value is read as a TOML literal, or as a plain string when it isn't one.
fn apply_override(table: &mut toml::Table, entry: &str) -> anyhow::Result<()> {
    let Some((key, raw)) = entry.split_once('=') else {
        bail!("Config override must look like key.path=value: {}", entry);
    };
    let value = parse_override_value(raw.trim());

    let mut segments: Vec<&str> = key.trim().split('.').collect();
    let Some(last) = segments.pop().filter(|s| !s.is_empty()) else {
        bail!("Config override has an empty key: {}", entry);
    };

    let mut current = table;
    for segment in segments {
        current = current
            .entry(segment)
            .or_insert(toml::Value::Table(toml::Table::new()))
            .as_table_mut()
            .with_context(|| format!("Config key {} is not a table", segment))?;
    }
    current.insert(last.to_string(), value);
    Ok(())
}

fn parse_override_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {}", raw))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
