//! # Gateway Telemetry
//!
//! Structured logging for the bus gateway: a `tracing-subscriber` registry
//! with an `EnvFilter` and either a human-readable or a JSON formatting layer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() {
//!     init_tracing(&TelemetryConfig::from_env()).expect("Failed to init tracing");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GW_SERVICE_NAME` | `bus-gateway` | Service name in the startup event |
//! | `GW_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `GW_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `GW_JSON_LOGS` | `false` | JSON lines instead of pretty output |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{init_tracing, try_init_for_tests};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
