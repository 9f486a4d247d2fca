//! The `{data, error}` wire envelope.
//!
//! Every body in both directions uses it. Requests always carry
//! `error: null`; a response is successful iff its `error` is absent or null.

use crate::error::{RemoteFailure, RpcError};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub data: Value,
    pub error: Option<Value>,
}

impl Envelope {
    /// Outbound request wrapper: `{data: payload, error: null}`.
    pub fn request(payload: Value) -> Self {
        Self {
            data: payload,
            error: None,
        }
    }

    /// Wire bytes; an absent `error` is written as `null`.
    pub fn encode(&self) -> Result<Bytes, RpcError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| RpcError::Encode(e.to_string()))
    }

    /// Parse a response body.
    ///
    /// The body must be a JSON object holding at least one of `data` and
    /// `error`; bare values are rejected rather than guessed at.
    pub fn decode(body: &[u8]) -> Result<Self, RpcError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RpcError::Decode(format!("invalid JSON body: {e}")))?;

        let Value::Object(mut fields) = value else {
            return Err(RpcError::Decode(format!(
                "expected an envelope object, got {}",
                kind_of(&value)
            )));
        };
        if !fields.contains_key("data") && !fields.contains_key("error") {
            return Err(RpcError::Decode(
                "object has neither `data` nor `error`".into(),
            ));
        }

        Ok(Self {
            data: fields.remove("data").unwrap_or(Value::Null),
            error: fields.remove("error").filter(|e| !e.is_null()),
        })
    }

    /// `data` on success, the verbatim `error` otherwise.
    pub fn into_result(self) -> Result<Value, RemoteFailure> {
        match self.error {
            Some(error) => Err(RemoteFailure::new(error)),
            None => Ok(self.data),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
