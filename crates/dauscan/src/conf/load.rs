//! Load — config loading from file and environment variables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::{AppConfig, ConfigError};

impl AppConfig {
    /// Load configuration from file or built-in defaults.
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load(path_override: Option<&str>) -> Result<Self, ConfigError> {
        let config_path = path_override
            .map(str::to_string)
            .or_else(|| std::env::var("DAUSCAN_CONFIG_FILE").ok())
            .unwrap_or_else(|| "/etc/dauscan/dauscan.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!(
                "Config file not found at {}, using built-in defaults",
                config_path
            );
            Self::default()
        };

        // Environment variables override file config for deploy-time settings
        if let Ok(url) = std::env::var("DAUSCAN_REDIS_URL") {
            config.store.redis_url = url;
        }
        if let Ok(prefix) = std::env::var("DAUSCAN_KEY_PREFIX") {
            config.store.key_prefix = prefix;
        }
        for source in &mut config.sources {
            let var = format!(
                "DAUSCAN_{}_DIR",
                source.name.to_uppercase().replace('-', "_")
            );
            if let Ok(dir) = std::env::var(&var) {
                source.dir = dir;
            }
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let mut file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|source| ConfigError::Io {
                path: path.to_string(),
                source,
            })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────
