//! Service configuration loaded from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE: &str = "timeseries.db";
pub const DEFAULT_QUERY_ENDPOINT: &str = "GetTimeSeriesData";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// `ZOO_LISTEN` if set, else `0.0.0.0:$PORT`.
    pub listen: SocketAddr,
    /// Store connection string (`TIMESERIES_DB`).
    pub database: String,
    /// Path segment of `POST /api/{endpoint}` and the audit function name (`QUERY_ENDPOINT`).
    pub query_endpoint: String,
    /// Per-request store timeout (`QUERY_TIMEOUT_SECS`).
    pub query_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen = match lookup("ZOO_LISTEN") {
            Some(addr) => addr.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                name: "ZOO_LISTEN",
                value: addr.clone(),
                reason: e.to_string(),
            })?,
            None => {
                let port = match lookup("PORT") {
                    Some(p) => p.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                        name: "PORT",
                        value: p.clone(),
                        reason: e.to_string(),
                    })?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
            }
        };

        let database = lookup("TIMESERIES_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let query_endpoint =
            lookup("QUERY_ENDPOINT").unwrap_or_else(|| DEFAULT_QUERY_ENDPOINT.to_string());
        if query_endpoint.is_empty() || query_endpoint.contains('/') {
            return Err(ConfigError::Invalid {
                name: "QUERY_ENDPOINT",
                value: query_endpoint,
                reason: "must be a single non-empty path segment".to_string(),
            });
        }

        let query_timeout = match lookup("QUERY_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    name: "QUERY_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        name: "QUERY_TIMEOUT_SECS",
                        value: raw,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        };

        Ok(Self {
            listen,
            database,
            query_endpoint,
            query_timeout,
        })
    }
}
