//! Runtime configuration, read from the environment (and `.env` via dotenvy).

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_POOL_SIZE: usize = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path or URL.
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Maximum pooled store connections.
    pub db_pool_size: usize,
    /// Shared secret the document platform presents when delivering
    /// booking events. Without it the events endpoint accepts nothing.
    pub events_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr: SocketAddr = parse_or("BIND_ADDR", lookup("BIND_ADDR"), || {
            DEFAULT_BIND_ADDR.parse::<SocketAddr>().map_err(|err| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_owned(),
                reason: format!("{err}"),
            })
        })?;

        let db_pool_size: usize = parse_or("DB_POOL_SIZE", lookup("DB_POOL_SIZE"), || {
            Ok(DEFAULT_POOL_SIZE)
        })?;
        if db_pool_size == 0 {
            return Err(ConfigError::Invalid {
                name: "DB_POOL_SIZE",
                value: "0".to_owned(),
                reason: "pool needs at least one connection".to_owned(),
            });
        }

        let events_token = lookup("EVENTS_TOKEN").filter(|token| !token.trim().is_empty());

        Ok(Config {
            database_url,
            bind_addr,
            db_pool_size,
            events_token,
        })
    }
}

fn parse_or<T, D>(name: &'static str, raw: Option<String>, default: D) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    D: FnOnce() -> Result<T, ConfigError>,
{
    match raw {
        Some(value) => value.parse().map_err(|err: T::Err| ConfigError::Invalid {
            name,
            reason: err.to_string(),
            value,
        }),
        None => default(),
    }
}
