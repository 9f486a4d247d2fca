//! # Bus Gateway Test Suite
//!
//! Cross-crate scenarios run against the in-memory broker, with scripted
//! responders standing in for the services that own the data.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs     # Engine harness, fake data owners
//!     ├── correlation.rs  # Request/response matching, timeouts, errors
//!     ├── lifecycle.rs    # Connection and subscription lifecycle
//!     ├── services.rs     # Domain clients end to end
//!     └── properties.rs   # Property tests
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gateway-tests
//! cargo test -p gateway-tests integration::correlation::
//! RUST_LOG=gateway_rpc=debug cargo test -p gateway-tests -- --nocapture
//! ```

#![allow(dead_code)]

pub mod integration;
