use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    pub bind_addr: String,
    /// Exact origins allowed for cross-origin requests; empty allows any.
    pub allowed_origins: Vec<String>,
    pub rate_limit_points: u32,
    pub rate_limit_window_ms: u64,
    pub default_ttl_ms: u64,
    pub max_ttl_ms: u64,
    pub envelope_sweep_interval_ms: u64,
    pub session_sweep_interval_ms: u64,
    pub session_idle_ms: u64,
    pub replication_timeout_ms: u64,
    pub max_push_attempts: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: Vec::new(),
            rate_limit_points: 100,
            rate_limit_window_ms: 60_000,
            default_ttl_ms: 24 * 60 * 60 * 1000,
            max_ttl_ms: 7 * 24 * 60 * 60 * 1000,
            envelope_sweep_interval_ms: 5 * 60 * 1000,
            session_sweep_interval_ms: 60 * 1000,
            session_idle_ms: 5 * 60 * 1000,
            replication_timeout_ms: 5_000,
            max_push_attempts: 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation {0}")]
    Validation(String),
}

impl BrokerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.rate_limit_points == 0 {
            return Err(ConfigError::Validation("rate_limit_points".to_string()));
        }
        if self.rate_limit_window_ms == 0 {
            return Err(ConfigError::Validation("rate_limit_window_ms".to_string()));
        }
        if self.default_ttl_ms == 0 || self.max_ttl_ms == 0 {
            return Err(ConfigError::Validation("ttl".to_string()));
        }
        if self.default_ttl_ms > self.max_ttl_ms {
            return Err(ConfigError::Validation("default_ttl_ms".to_string()));
        }
        if self.envelope_sweep_interval_ms == 0 || self.session_sweep_interval_ms == 0 {
            return Err(ConfigError::Validation("sweep_interval".to_string()));
        }
        if self.session_idle_ms == 0 {
            return Err(ConfigError::Validation("session_idle_ms".to_string()));
        }
        if self.replication_timeout_ms == 0 {
            return Err(ConfigError::Validation("replication_timeout_ms".to_string()));
        }
        if self.max_push_attempts == 0 {
            return Err(ConfigError::Validation("max_push_attempts".to_string()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::Validation("bind_addr".to_string()))
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}
