use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use thiserror::Error;
use tracing::info;

const MIN_SECRET_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),

    #[error("invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub session_secret: String,
    pub session_ttl_hours: i64,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = required(&lookup, "DATABASE_URL")?;
        let session_secret = required(&lookup, "SESSION_SECRET")?;
        if session_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "SESSION_SECRET",
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let session_ttl_hours: i64 = try_load(&lookup, "SESSION_TTL_HOURS", "336")?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_HOURS",
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr: try_load(&lookup, "BIND_ADDR", "0.0.0.0:3000")?,
            session_secret,
            session_ttl_hours,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}
