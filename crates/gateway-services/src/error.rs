//! Service client errors.

use gateway_rpc::{RemoteFailure, RpcError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A create was acknowledged with nothing.
    #[error("failed to save {resource}")]
    NotPersisted { resource: &'static str },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The owning service could not be reached in time.
    #[error("service unavailable: {0}")]
    Unavailable(RpcError),

    #[error("service rejected the request: {0}")]
    Remote(RemoteFailure),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Like `From<RpcError>`, but a remote `NotFound` names `resource`.
    pub(crate) fn for_resource(err: RpcError, resource: &'static str) -> Self {
        if err.is_remote_kind("NotFound") {
            return Self::NotFound { resource };
        }
        err.into()
    }
}

impl From<RpcError> for ServiceError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Remote(failure) => Self::Remote(failure),
            RpcError::Decode(reason) => Self::InvalidResponse(reason),
            RpcError::Encode(reason) => Self::InvalidInput(reason),
            other @ (RpcError::Transport(_)
            | RpcError::Timeout { .. }
            | RpcError::CorrelationCollision { .. }) => Self::Unavailable(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
