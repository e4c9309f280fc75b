//! Conf module — configuration model, loading, and validation.

pub mod load;
pub mod model;

pub use model::{AppConfig, ConfigError, SourceConfig, StoreConfig};
