//! Model — AppConfig and related structs.
//!
//! Configuration is immutable once constructed: it is loaded (or defaulted)
//! at process start, validated, and then only read. Capture patterns are
//! compiled from these values exactly once, in [`crate::logs::source`].

use std::fmt::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub redis_url: String,
    /// Bitmap key namespace; the `%Y%m%d` day key is appended.
    pub key_prefix: String,
    /// Smallest identifier belonging to the counted population.
    pub base_offset: u64,
    /// Number of bitmap slots; identifiers at or past `base_offset +
    /// max_population` are rejected to bound per-day bitmap size.
    pub max_population: u64,
}

/// One log category to scan (device API calls, alert-image API calls, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub name: String,
    /// Directory holding one log file per calendar day.
    pub dir: String,
    /// chrono format template producing the file name for a day,
    /// e.g. `pps.%Y%m%d.log` or `alert-image-%Y-%m-%d.log.gz`.
    pub file_template: String,
    /// How many days back to scan; the CLI argument overrides this.
    pub lookback_days: i64,
    /// Substring a line must contain before the capture pattern is tried.
    pub line_filter: String,
    /// Regex with exactly one capture group extracting the identifier.
    pub id_pattern: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            sources: vec![
                // Device-list API calls, plain-text tomcat log.
                SourceConfig {
                    name: "device-api".to_string(),
                    dir: "/data/logs/tomcat/".to_string(),
                    file_template: "pps.%Y%m%d.log".to_string(),
                    lookback_days: 1,
                    line_filter: "<getDevice>".to_string(),
                    id_pattern: r"<userID>(\d+)<userToken>".to_string(),
                },
                // Alert-image API calls, gzip-rotated log.
                SourceConfig {
                    name: "alert-image-api".to_string(),
                    dir: "/data/logs/alert/".to_string(),
                    file_template: "alert-image-%Y-%m-%d.log.gz".to_string(),
                    lookback_days: 1,
                    line_filter: "<selectMessageByDeviceUUID>".to_string(),
                    id_pattern: r"<userID>(\d+)<sourceApp>".to_string(),
                },
            ],
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1/".to_string(),
            key_prefix: "AU".to_string(),
            base_offset: 10_000_000,
            max_population: 100_000,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            dir: String::new(),
            file_template: String::new(),
            lookback_days: 1,
            line_filter: String::new(),
            id_pattern: String::new(),
        }
    }
}

impl AppConfig {
    /// Validate that the configuration is processable before anything runs.
    ///
    /// A bad config aborts the whole run, unlike per-file errors which are
    /// recovered day by day.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.key_prefix.is_empty() {
            return Err(ConfigError::Invalid("store.key_prefix must not be empty".to_string()));
        }
        if self.store.max_population == 0 {
            return Err(ConfigError::Invalid("store.max_population must be > 0".to_string()));
        }
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid("at least one log source is required".to_string()));
        }
        for source in &self.sources {
            source.validate()?;
        }
        Ok(())
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("source.name must not be empty".to_string()));
        }
        if self.file_template.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "source {}: file_template must not be empty",
                self.name
            )));
        }
        if self.line_filter.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "source {}: line_filter must not be empty",
                self.name
            )));
        }
        if !Path::new(&self.dir).is_dir() {
            return Err(ConfigError::Invalid(format!(
                "source {}: log directory not found: {}",
                self.name, self.dir
            )));
        }
        // A bad chrono specifier only surfaces when the template renders, so
        // probe it here where it is still a fatal config error.
        let mut rendered = String::new();
        if write!(rendered, "{}", chrono::NaiveDate::default().format(&self.file_template)).is_err()
        {
            return Err(ConfigError::Invalid(format!(
                "source {}: bad file_template: {}",
                self.name, self.file_template
            )));
        }
        let pattern = regex::Regex::new(&self.id_pattern).map_err(|e| {
            ConfigError::Invalid(format!("source {}: bad id_pattern: {}", self.name, e))
        })?;
        // captures_len counts the implicit whole-match group.
        if pattern.captures_len() != 2 {
            return Err(ConfigError::Invalid(format!(
                "source {}: id_pattern must have exactly one capture group",
                self.name
            )));
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────
