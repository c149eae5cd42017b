use super::Config;
use crate::{Error, Result};
use std::collections::HashMap;
use std::str::FromStr;

/// Keys accepted by `-P key=value`.
pub const KEYS: &[&str] = &[
    "base_url",
    "download_dir",
    "headless",
    "max_pages",
    "per_keyword_limit",
    "query",
];

/// Command-line overrides layered on top of the YAML config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: HashMap<String, String>,
}

impl Overrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an override.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse from CLI args like "key=value".
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut overrides = Self::new();
        for arg in args {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid override '{}', expected key=value", arg))
            })?;
            let key = key.trim();
            if !KEYS.contains(&key) {
                return Err(Error::Config(format!(
                    "unknown override '{}' (known: {})",
                    key,
                    KEYS.join(", ")
                )));
            }
            overrides.values.insert(key.to_string(), value.trim().to_string());
        }
        Ok(overrides)
    }

    /// Apply onto `config` and re-validate.
    ///
    /// `max_pages` applies to both the default search and the campaign.
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        for (key, value) in &self.values {
            match key.as_str() {
                "base_url" => config.site.base_url = value.clone(),
                "download_dir" => config.paths.download_dir = value.into(),
                "headless" => config.browser.headless = parse_value(key, value)?,
                "max_pages" => {
                    let pages = parse_value(key, value)?;
                    config.search.max_pages = pages;
                    config.campaign.max_pages = pages;
                }
                "per_keyword_limit" => {
                    config.campaign.per_keyword_limit = parse_value(key, value)?
                }
                "query" => config.search.query = value.clone(),
                other => return Err(Error::Config(format!("unknown override '{}'", other))),
            }
        }
        config.validate()
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("invalid value '{}' for {}", value, key)))
}
