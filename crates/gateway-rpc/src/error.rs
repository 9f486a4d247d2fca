//! Correlation engine error types.
//!
//! Callers must be able to tell "the remote never answered" (`Timeout`,
//! `Transport`) apart from "the remote said no" (`Remote`).

use gateway_bus::BusError;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The verbatim `error` value of a response envelope.
///
/// Responders conventionally send `{kind, message}`; anything else is kept
/// as-is and rendered as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFailure(Value);

impl RemoteFailure {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// `error.kind`, when the remote sent one.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(Value::as_str)
    }

    /// `error.message`, when the remote sent one.
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind(), self.message()) {
            (Some(kind), Some(message)) => write!(f, "{kind}: {message}"),
            (Some(kind), None) => f.write_str(kind),
            (None, Some(message)) => f.write_str(message),
            (None, None) => write!(f, "{}", self.0),
        }
    }
}

impl std::error::Error for RemoteFailure {}

/// Errors surfaced by [`crate::CorrelationEngine::call`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    /// Connect, subscribe or publish failed, or the connection went away.
    #[error("transport error: {0}")]
    Transport(#[from] BusError),

    /// No matching response before the deadline.
    #[error("gateway timeout: {request_topic} did not answer within {}ms", .after.as_millis())]
    Timeout { request_topic: String, after: Duration },

    /// The response envelope carried a non-null `error`.
    #[error("remote error: {0}")]
    Remote(RemoteFailure),

    /// The response body was not a valid envelope, or `data` had the wrong shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// Every generated correlation ID was already in flight.
    #[error("could not allocate a unique correlation id after {attempts} attempts")]
    CorrelationCollision { attempts: u32 },
}

impl RpcError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// True for a remote error whose `kind` equals `kind`.
    pub fn is_remote_kind(&self, kind: &str) -> bool {
        matches!(self, Self::Remote(failure) if failure.kind() == Some(kind))
    }

    pub fn remote(&self) -> Option<&RemoteFailure> {
        match self {
            Self::Remote(failure) => Some(failure),
            _ => None,
        }
    }
}
