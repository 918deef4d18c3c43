//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! Sensitive values wrapped in secrecy::SecretString to prevent log leaks.

mod weights;

pub use secrecy::{ExposeSecret, SecretString};
pub use weights::load_weights;

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::ranking::RankingWeights;

const DEFAULT_SWEEP_SECS: u64 = 60;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    /// Ranking weights, from `RANKING_WEIGHTS_FILE` or the defaults.
    pub weights: RankingWeights,
    pub weights_file: Option<PathBuf>,
    /// Interval of the periodic expiry sweep.
    pub sweep_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    /// In production, systemd EnvironmentFile provides the vars.
    pub fn from_env() -> Result<Self> {
        let weights_file = std::env::var("RANKING_WEIGHTS_FILE").ok().map(PathBuf::from);
        let weights = match &weights_file {
            Some(path) => load_weights(path)?,
            None => RankingWeights::default(),
        };
        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            weights,
            weights_file,
            sweep_interval: Duration::from_secs(sweep_secs()?),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn sweep_secs() -> Result<u64> {
    let Ok(raw) = std::env::var("EXPIRY_SWEEP_SECS") else {
        return Ok(DEFAULT_SWEEP_SECS);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(Error::Config(format!(
            "EXPIRY_SWEEP_SECS must be a positive number of seconds, got {raw:?}"
        ))),
    }
}
