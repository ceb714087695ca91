//! Service configuration from environment variables.
//!
//! Loaders take a lookup closure so tests never touch the process
//! environment. Binaries load `.env` first and then call `from_env`.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::gateway::BasicAuth;
use crate::retry::RetryPolicy;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &'static str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed_or<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => parse(name, &raw),
            None => Ok(default),
        }
    }

    fn credentials(&self, user: &'static str, password: &'static str) -> Result<BasicAuth, ConfigError> {
        Ok(BasicAuth {
            username: self.required(user)?,
            password: self.required(password)?,
        })
    }
}

fn parse<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn os_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseServiceConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub http_addr: SocketAddr,
    pub basic_auth: BasicAuth,
}

impl WarehouseServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(os_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        Ok(Self {
            database_url: env.required("DATABASE_URL")?,
            database_max_connections: env.parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
            http_addr: env.parsed_or("WAREHOUSE_HTTP_ADDR", SocketAddr::from(([0, 0, 0, 0], 8082)))?,
            basic_auth: env
                .credentials("WAREHOUSE_BASIC_AUTH_USERNAME", "WAREHOUSE_BASIC_AUTH_PASSWORD")?,
        })
    }
}

/// Connection details for one collaborating service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub host: String,
    pub auth: BasicAuth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderServiceConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub http_addr: SocketAddr,
    pub product_service: ServiceEndpoint,
    pub warehouse_service: ServiceEndpoint,
    pub order_expiration: Duration,
    pub http_timeout: Duration,
    pub http_retry_max: u32,
}

impl OrderServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(os_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let expiration_secs: u64 = parse(
            "ORDER_EXPIRATION_TIME_SECOND",
            &env.required("ORDER_EXPIRATION_TIME_SECOND")?,
        )?;
        if expiration_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "ORDER_EXPIRATION_TIME_SECOND",
                reason: "must be greater than zero".into(),
            });
        }

        Ok(Self {
            database_url: env.required("DATABASE_URL")?,
            database_max_connections: env.parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
            http_addr: env.parsed_or("ORDER_HTTP_ADDR", SocketAddr::from(([0, 0, 0, 0], 8081)))?,
            product_service: ServiceEndpoint {
                host: env.required("PRODUCT_SERVICE_HOST")?,
                auth: env.credentials(
                    "PRODUCT_SERVICE_BASIC_AUTH_USERNAME",
                    "PRODUCT_SERVICE_BASIC_AUTH_PASSWORD",
                )?,
            },
            warehouse_service: ServiceEndpoint {
                host: env.required("WAREHOUSE_SERVICE_HOST")?,
                auth: env.credentials(
                    "WAREHOUSE_SERVICE_BASIC_AUTH_USERNAME",
                    "WAREHOUSE_SERVICE_BASIC_AUTH_PASSWORD",
                )?,
            },
            order_expiration: Duration::from_secs(expiration_secs),
            http_timeout: Duration::from_secs(env.parsed_or("SERVICE_HTTP_TIMEOUT_SECOND", 10)?),
            http_retry_max: env.parsed_or("SERVICE_HTTP_RETRY_MAX", 3)?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_retries(self.http_retry_max)
    }

    /// Expiration window as a calendar duration.
    pub fn expiration_window(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::from_std(self.order_expiration).map_err(|e| ConfigError::Invalid {
            name: "ORDER_EXPIRATION_TIME_SECOND",
            reason: e.to_string(),
        })
    }
}
