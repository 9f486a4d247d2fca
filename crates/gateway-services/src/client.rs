//! Shared plumbing for the service clients.

use crate::error::{ServiceError, ServiceResult};
use crate::topics::TopicPair;
use gateway_rpc::RpcCaller;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// An `RpcCaller` plus the deadline its owner wants.
#[derive(Clone)]
pub struct ServiceClient {
    caller: Arc<dyn RpcCaller>,
    timeout: Option<Duration>,
}

impl ServiceClient {
    pub fn new(caller: Arc<dyn RpcCaller>) -> Self {
        Self {
            caller,
            timeout: None,
        }
    }

    /// Override the engine's default deadline for every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Raw `data` of the response.
    pub async fn send(
        &self,
        topics: TopicPair,
        payload: Value,
        resource: &'static str,
    ) -> ServiceResult<Value> {
        debug!(request_topic = topics.request, resource = resource, "Service call");
        self.caller
            .call(payload, topics.request, topics.response, self.timeout)
            .await
            .map_err(|e| ServiceError::for_resource(e, resource))
    }

    /// `data` decoded as `T`; `null` is `None`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        topics: TopicPair,
        payload: Value,
        resource: &'static str,
    ) -> ServiceResult<Option<T>> {
        let data = self.send(topics, payload, resource).await?;
        if data.is_null() {
            return Ok(None);
        }
        serde_json::from_value(data)
            .map(Some)
            .map_err(|e| ServiceError::InvalidResponse(format!("{resource}: {e}")))
    }

    /// A single record that must exist.
    pub async fn lookup<T: DeserializeOwned>(
        &self,
        topics: TopicPair,
        payload: Value,
        resource: &'static str,
    ) -> ServiceResult<T> {
        self.fetch(topics, payload, resource)
            .await?
            .ok_or(ServiceError::NotFound { resource })
    }

    /// A list; `null` means empty.
    pub async fn list<T: DeserializeOwned>(
        &self,
        topics: TopicPair,
        payload: Value,
        resource: &'static str,
    ) -> ServiceResult<Vec<T>> {
        Ok(self.fetch(topics, payload, resource).await?.unwrap_or_default())
    }

    /// A create; `null` means the owner did not store it.
    pub async fn persist<T: DeserializeOwned>(
        &self,
        topics: TopicPair,
        payload: Value,
        resource: &'static str,
    ) -> ServiceResult<T> {
        self.fetch(topics, payload, resource)
            .await?
            .ok_or(ServiceError::NotPersisted { resource })
    }
}

pub(crate) fn to_payload<T: serde::Serialize>(record: &T) -> ServiceResult<Value> {
    serde_json::to_value(record).map_err(|e| ServiceError::InvalidInput(e.to_string()))
}
