use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::{info, warn};

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: Option<String>,
    pub entries_key: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            port: try_load("RUST_PORT", defaults.port)?,
            redis_host: try_load("REDIS_HOST", defaults.redis_host)?,
            redis_port: try_load("REDIS_PORT", defaults.redis_port)?,
            redis_password: read_secret("REDIS_PASSWORD").or_else(|| var("REDIS_PASSWORD").ok()),
            entries_key: try_load("ENTRIES_KEY", defaults.entries_key)?,
        })
    }

    /// Password is passed as its own field, never spliced into a URL.
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.redis_host.clone(), self.redis_port),
            redis: RedisConnectionInfo {
                password: self.redis_password.clone(),
                ..RedisConnectionInfo::default()
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 1111,
            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_password: None,
            entries_key: "entries".to_string(),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    parse_value(key, var(key).ok(), default)
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = raw else {
        info!("{key} not set, using default: {default}");
        return Ok(default);
    };

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");

        ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        }
    })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret file: {e}");
        })
        .ok()
}
