//! Bus configuration.

use crate::{DEFAULT_CLIENT_ID, DEFAULT_TOPIC_CAPACITY};
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid bus config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Identifier this process announces to the broker.
    pub client_id: String,
    /// Per-topic buffer of the in-memory broker.
    pub topic_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            topic_capacity: DEFAULT_TOPIC_CAPACITY,
        }
    }
}

impl BusConfig {
    /// Read overrides from `GW_BUS_CLIENT_ID` and `GW_BUS_TOPIC_CAPACITY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            client_id: env::var("GW_BUS_CLIENT_ID").unwrap_or(defaults.client_id),
            topic_capacity: env::var("GW_BUS_TOPIC_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.topic_capacity),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("client_id cannot be empty".into()));
        }
        if self.topic_capacity == 0 {
            return Err(ConfigError::Invalid("topic_capacity cannot be 0".into()));
        }
        Ok(())
    }
}
