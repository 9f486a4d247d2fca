//! Gateway RPC - request/response correlation over a publish/subscribe bus.
//!
//! A caller publishes a request on a request topic and awaits the answer
//! that some remote responder later publishes on the paired response topic.
//! Requests and responses are matched by a correlation ID carried in the
//! message headers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    CORRELATION ENGINE                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  call(payload, request_topic, response_topic, timeout)       │
//! │        │                                                     │
//! │  ┌─────┴──────┐   ┌──────────────────┐                       │
//! │  │ Connection │   │ Subscription     │  lazily, once each    │
//! │  │  (lazy)    │   │ Registry         │                       │
//! │  └─────┬──────┘   └────────┬─────────┘                       │
//! │        │                   │                                 │
//! │  ┌─────┴───────────────────┴────────┐                        │
//! │  │        Pending Call Table        │ ← deadline timers      │
//! │  │  (Async-to-Sync Bridge, oneshot) │                        │
//! │  └─────────────────┬────────────────┘                        │
//! │                    │ take + settle                           │
//! │  ┌─────────────────┴────────────────┐                        │
//! │  │            Dispatcher            │ ← inbound stream       │
//! │  └──────────────────────────────────┘                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gateway_rpc::{CorrelationEngine, RpcConfig};
//!
//! let engine = Arc::new(CorrelationEngine::new(bus_client, RpcConfig::from_env())?);
//! let user = engine
//!     .call(json!({"id": 7}), "request-user-by-id", "response-user-by-id", None)
//!     .await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod connection;
pub mod correlation;
pub mod dispatch;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod pending;
pub mod subscriptions;

// Re-exports for public API
pub use config::{ConfigError, RpcConfig, CORRELATION_HEADER, DEFAULT_CALL_TIMEOUT};
pub use connection::{Connection, ConnectionState};
pub use correlation::CorrelationId;
pub use dispatch::{Dispatcher, Routed};
pub use engine::{CorrelationEngine, RpcCaller};
pub use envelope::Envelope;
pub use error::{RemoteFailure, RpcError};
pub use pending::{CallOutcome, PendingCall, PendingCallTable, PendingStats};
pub use subscriptions::SubscriptionRegistry;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
