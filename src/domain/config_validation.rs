//! Configuration validation.
//!
//! Validates config fields before any store is opened or server started.

use crate::domain::error::CrossoverError;
use crate::domain::price_bar::{DEFAULT_INSTRUMENT, MAX_INSTRUMENT_LEN};
use crate::domain::signal::{SmaCrossover, window_from_i64};
use crate::ports::config_port::ConfigPort;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_SHORT_WINDOW: i64 = 20;
pub const DEFAULT_LONG_WINDOW: i64 = 50;
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_FETCH_TIMEOUT_SECS: i64 = 30;
pub const DEFAULT_POOL_SIZE: i64 = 4;
pub const MAX_POOL_SIZE: u32 = 64;

/// Storage backends selectable under `[database] backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
    Postgres,
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), CrossoverError> {
    let backend = backend(config)?;
    validate_database(config, backend)?;
    pool_size(config)?;
    strategy_from_config(config)?;
    default_instrument(config)?;
    listen_addr(config)?;
    fetch_timeout(config)?;
    Ok(())
}

pub fn backend(config: &dyn ConfigPort) -> Result<Backend, CrossoverError> {
    let value = config
        .get_string("database", "backend")
        .unwrap_or_else(|| "sqlite".to_string());
    match value.trim().to_lowercase().as_str() {
        "memory" => Ok(Backend::Memory),
        "sqlite" => Ok(Backend::Sqlite),
        "postgres" | "postgresql" => Ok(Backend::Postgres),
        other => Err(CrossoverError::ConfigInvalid {
            section: "database".to_string(),
            key: "backend".to_string(),
            reason: format!("unknown backend '{other}' (expected memory, sqlite or postgres)"),
        }),
    }
}

fn validate_database(config: &dyn ConfigPort, backend: Backend) -> Result<(), CrossoverError> {
    match backend {
        Backend::Memory => Ok(()),
        Backend::Sqlite => config.require_string("database", "path").map(|_| ()),
        Backend::Postgres => {
            if config.get_string("postgres", "connection_string").is_some()
                || config.get_string("database", "conninfo").is_some()
            {
                Ok(())
            } else {
                Err(CrossoverError::ConfigMissing {
                    section: "postgres".to_string(),
                    key: "connection_string".to_string(),
                })
            }
        }
    }
}

/// Builds the configured crossover, mapping parameter errors onto the
/// `[strategy]` section.
pub fn strategy_from_config(config: &dyn ConfigPort) -> Result<SmaCrossover, CrossoverError> {
    let short = config.get_int("strategy", "short_window", DEFAULT_SHORT_WINDOW)?;
    let long = config.get_int("strategy", "long_window", DEFAULT_LONG_WINDOW)?;

    let as_config_error = |key: &str, err: CrossoverError| CrossoverError::ConfigInvalid {
        section: "strategy".to_string(),
        key: key.to_string(),
        reason: err.to_string(),
    };

    let short = window_from_i64("short_window", short).map_err(|e| as_config_error("short_window", e))?;
    let long = window_from_i64("long_window", long).map_err(|e| as_config_error("long_window", e))?;
    SmaCrossover::new(short, long).map_err(|e| as_config_error("long_window", e))
}

pub fn default_instrument(config: &dyn ConfigPort) -> Result<String, CrossoverError> {
    let instrument = config
        .get_string("ingest", "instrument")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| DEFAULT_INSTRUMENT.to_string());
    if instrument.is_empty() || instrument.chars().count() > MAX_INSTRUMENT_LEN {
        return Err(CrossoverError::ConfigInvalid {
            section: "ingest".to_string(),
            key: "instrument".to_string(),
            reason: format!("instrument must be 1 to {MAX_INSTRUMENT_LEN} characters"),
        });
    }
    Ok(instrument)
}

/// Connection pool size, `[database] pool_size`, within `1..=MAX_POOL_SIZE`.
pub fn pool_size(config: &dyn ConfigPort) -> Result<u32, CrossoverError> {
    let raw = config.get_int("database", "pool_size", DEFAULT_POOL_SIZE)?;
    u32::try_from(raw)
        .ok()
        .filter(|size| (1..=MAX_POOL_SIZE).contains(size))
        .ok_or_else(|| CrossoverError::ConfigInvalid {
            section: "database".to_string(),
            key: "pool_size".to_string(),
            reason: format!("must be between 1 and {MAX_POOL_SIZE}, got {raw}"),
        })
}

/// Timeout for HTTP ingestion sources, `[ingest] timeout_secs`.
pub fn fetch_timeout(config: &dyn ConfigPort) -> Result<Duration, CrossoverError> {
    let secs = config.get_int("ingest", "timeout_secs", DEFAULT_FETCH_TIMEOUT_SECS)?;
    if secs <= 0 {
        return Err(CrossoverError::ConfigInvalid {
            section: "ingest".to_string(),
            key: "timeout_secs".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(Duration::from_secs(secs as u64))
}

pub fn listen_addr(config: &dyn ConfigPort) -> Result<SocketAddr, CrossoverError> {
    config
        .get_string("web", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string())
        .parse()
        .map_err(|_| CrossoverError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: "expected host:port".to_string(),
        })
}
