//! Cross-crate integration scenarios.

pub mod fixtures;
pub mod lifecycle;
pub mod properties;
pub mod services;
