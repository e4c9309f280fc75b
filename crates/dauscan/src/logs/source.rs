//! Source — a log source config compiled into its runtime form.

use std::path::PathBuf;

use regex::Regex;

use super::extract::Extractor;
use crate::conf::{ConfigError, SourceConfig};

/// A [`SourceConfig`] with its patterns compiled, ready to scan.
///
/// Compilation happens once at startup and nothing here mutates afterward,
/// so the per-line hot loop never touches the regex compiler.
pub struct LogSource {
    pub name: String,
    pub dir: PathBuf,
    pub file_template: String,
    pub lookback_days: i64,
    pub extractor: Extractor,
}

impl LogSource {
    /// `lookback_override` comes from the CLI and wins over the configured
    /// value when present.
    pub fn compile(
        config: &SourceConfig,
        lookback_override: Option<i64>,
    ) -> Result<Self, ConfigError> {
        let pattern = Regex::new(&config.id_pattern).map_err(|e| {
            ConfigError::Invalid(format!("source {}: bad id_pattern: {}", config.name, e))
        })?;
        if pattern.captures_len() != 2 {
            return Err(ConfigError::Invalid(format!(
                "source {}: id_pattern must have exactly one capture group",
                config.name
            )));
        }

        Ok(Self {
            name: config.name.clone(),
            dir: PathBuf::from(&config.dir),
            file_template: config.file_template.clone(),
            lookback_days: lookback_override.unwrap_or(config.lookback_days),
            extractor: Extractor::new(&config.line_filter, pattern)?,
        })
    }
}
