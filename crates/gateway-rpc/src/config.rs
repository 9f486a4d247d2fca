//! Correlation engine configuration with validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Deadline applied when a call does not pass its own.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Metadata key carrying the correlation ID on the wire.
pub const CORRELATION_HEADER: &str = "correlationId";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("invalid correlation header: {0}")]
    InvalidHeader(String),
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Per-call deadline when none is given.
    #[serde(with = "humantime_serde")]
    pub default_timeout: Duration,
    /// Header name used for correlation on requests and responses.
    pub correlation_header: String,
    /// Fresh IDs tried before giving up on a collision.
    pub max_register_attempts: u32,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_CALL_TIMEOUT,
            correlation_header: CORRELATION_HEADER.to_string(),
            max_register_attempts: 3,
        }
    }
}

impl RpcConfig {
    /// Create configuration from environment variables.
    ///
    /// - `GW_RPC_TIMEOUT_MS`: default call deadline (default: 10000)
    /// - `GW_CORRELATION_HEADER`: correlation header name (default: correlationId)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_timeout: env::var("GW_RPC_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.default_timeout),
            correlation_header: env::var("GW_CORRELATION_HEADER")
                .unwrap_or(defaults.correlation_header),
            max_register_attempts: defaults.max_register_attempts,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "default timeout cannot be 0".into(),
            ));
        }
        if self.correlation_header.trim().is_empty() {
            return Err(ConfigError::InvalidHeader("header name cannot be empty".into()));
        }
        if self.max_register_attempts == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_register_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
