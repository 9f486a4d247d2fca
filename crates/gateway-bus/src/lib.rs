//! # Gateway Bus - Publish/Subscribe Transport Interface
//!
//! The gateway never talks to the services that own its data directly. Every
//! request is published on a request topic and every answer arrives on a
//! paired response topic.
//!
//! ```text
//! ┌──────────────┐   publish(request-*)   ┌──────────────┐
//! │   Gateway    │ ─────────────────────→ │    Broker    │
//! │              │ ←───────────────────── │              │
//! └──────────────┘  subscribe(response-*) └──────────────┘
//!                                                ↑ ↓
//!                                          Remote responders
//! ```
//!
//! This crate defines the [`BusClient`] seam the correlation engine consumes
//! and ships an in-memory broker used by tests and single-process setups.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod client;
pub mod config;
pub mod memory;
pub mod message;
pub mod responder;

// Re-export main types
pub use client::{BusClient, BusError, BusResult, MessageStream};
pub use config::{BusConfig, ConfigError};
pub use memory::{InMemoryBroker, InMemoryBusClient};
pub use message::{BusMessage, Headers};
pub use responder::Responder;

/// Messages buffered per topic before slow subscribers start lagging.
pub const DEFAULT_TOPIC_CAPACITY: usize = 1000;

/// Client identifier announced to the broker when none is configured.
pub const DEFAULT_CLIENT_ID: &str = "gateway";
