//! Boot — logging init, config load, source compilation, store connection.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::conf::AppConfig;
use crate::logs::LogSource;
use crate::store::{BitmapWriter, RedisStore};

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dauscan=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load and validate configuration, compile the sources, connect to the
/// store. Everything fatal happens here, before any log file is touched.
pub async fn boot(cli: &Cli) -> anyhow::Result<(Vec<LogSource>, BitmapWriter)> {
    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let lookback_override = cli.days_back.map(i64::from);
    let sources = config
        .sources
        .iter()
        .map(|source| LogSource::compile(source, lookback_override))
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        "{} log sources configured, lookback {} day(s)",
        sources.len(),
        sources.first().map_or(0, |s| s.lookback_days)
    );

    let store = RedisStore::connect(&config.store.redis_url)
        .await
        .with_context(|| format!("store unavailable at {}", config.store.redis_url))?;

    Ok((sources, BitmapWriter::new(Arc::new(store), &config.store)))
}
