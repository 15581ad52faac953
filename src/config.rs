use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool_size: u32,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            info!(".env file not found, reading process environment only");
        }

        Ok(Self {
            database_url: try_load("DATABASE_URL", "foodgram.sqlite3")?,
            host: try_load("HOST", "0.0.0.0")?,
            port: try_load("PORT", "8000")?,
            pool_size: try_load("POOL_SIZE", "8")?,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            database_url: ":memory:".to_owned(),
            host: "127.0.0.1".to_owned(),
            port: 0,
            pool_size: 1,
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
            key: "HOST",
            value: addr,
            reason: e.to_string(),
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::InvalidValue {
            key,
            value,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_value_is_reported_with_its_key() {
        env::set_var("FOODGRAM_TEST_POOL", "many");

        let error = try_load::<u32>("FOODGRAM_TEST_POOL", "8").unwrap_err();

        let ConfigError::InvalidValue { key, value, .. } = error;
        assert_eq!(key, "FOODGRAM_TEST_POOL");
        assert_eq!(value, "many");
    }

    #[test]
    fn missing_value_falls_back_to_default() {
        let port: u16 = try_load("FOODGRAM_TEST_UNSET_PORT", "8000").unwrap();

        assert_eq!(port, 8000);
    }

    #[test]
    fn listen_addr_combines_host_and_port() {
        let config = Config {
            port: 9000,
            ..Config::in_memory()
        };

        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:9000");
    }
}
