//! Correlation engine: "ask over pub/sub, await like a call".

use crate::config::{ConfigError, RpcConfig};
use crate::connection::{Connection, ConnectionState};
use crate::correlation::CorrelationId;
use crate::envelope::Envelope;
use crate::error::RpcError;
use crate::pending::{CallOutcome, PendingCallTable, PendingStats};
use crate::subscriptions::SubscriptionRegistry;
use async_trait::async_trait;
use gateway_bus::{BusClient, BusError, Headers};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, info_span, warn, Instrument};

/// Seam used by domain service clients.
#[async_trait]
pub trait RpcCaller: Send + Sync {
    /// Publish `payload` on `request_topic` and wait for the correlated
    /// response on `response_topic`. `None` uses the configured default
    /// deadline.
    async fn call(
        &self,
        payload: Value,
        request_topic: &str,
        response_topic: &str,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError>;
}

/// Shared handle: create once at startup, hand an `Arc` to every client.
///
/// The bus connection is opened by the first call and stays open until
/// [`CorrelationEngine::shutdown`]; calls never tear it down.
pub struct CorrelationEngine {
    config: RpcConfig,
    client: Arc<dyn BusClient>,
    connection: Connection,
    subscriptions: Arc<SubscriptionRegistry>,
    pending: Arc<PendingCallTable>,
}

impl CorrelationEngine {
    /// Build an engine over `client`. Nothing connects until the first call.
    ///
    /// Rejects a configuration that [`RpcConfig::validate`] rejects.
    pub fn new(client: Arc<dyn BusClient>, config: RpcConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let pending = Arc::new(PendingCallTable::new());
        let subscriptions = Arc::new(SubscriptionRegistry::new(client.clone()));
        Ok(Self {
            connection: Connection::new(
                client.clone(),
                pending.clone(),
                subscriptions.clone(),
                config.correlation_header.clone(),
            ),
            subscriptions,
            pending,
            client,
            config,
        })
    }

    /// Send a request and wait for its response's `data`.
    pub async fn call(
        &self,
        payload: Value,
        request_topic: &str,
        response_topic: &str,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError> {
        let timeout = timeout.unwrap_or(self.config.default_timeout);
        let span = info_span!(
            "rpc_call",
            request_topic = request_topic,
            response_topic = response_topic
        );

        self.call_inner(payload, request_topic, response_topic, timeout)
            .instrument(span)
            .await
    }

    /// [`Self::call`] with `data` decoded into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        payload: Value,
        request_topic: &str,
        response_topic: &str,
        timeout: Option<Duration>,
    ) -> Result<T, RpcError> {
        let data = self
            .call(payload, request_topic, response_topic, timeout)
            .await?;
        serde_json::from_value(data).map_err(|e| RpcError::Decode(e.to_string()))
    }

    async fn call_inner(
        &self,
        payload: Value,
        request_topic: &str,
        response_topic: &str,
        timeout: Duration,
    ) -> Result<Value, RpcError> {
        self.connection.ensure_connected().await?;
        self.subscriptions.ensure_subscribed(response_topic).await?;

        let (id, receiver) = self.register(request_topic, timeout)?;
        let headers = Headers::new().with(self.config.correlation_header.clone(), id.to_string());
        let body = match Envelope::request(payload).encode() {
            Ok(body) => body,
            Err(e) => {
                self.pending.cancel(&id);
                return Err(e);
            }
        };

        if let Err(e) = self.client.publish(request_topic, body, headers).await {
            if self.pending.cancel(&id) {
                warn!(correlation_id = %id, error = %e, "Publish failed");
                return Err(RpcError::Transport(e));
            }
            // The deadline claimed the entry first; its outcome is waiting.
        } else {
            debug!(correlation_id = %id, "Request published");
        }

        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(RpcError::Transport(BusError::Closed)),
        }
    }

    fn register(
        &self,
        request_topic: &str,
        timeout: Duration,
    ) -> Result<(CorrelationId, oneshot::Receiver<CallOutcome>), RpcError> {
        let attempts = self.config.max_register_attempts.max(1);
        for _ in 0..attempts {
            let id = CorrelationId::new();
            if let Some(receiver) = self.pending.register(id, request_topic, timeout) {
                return Ok((id, receiver));
            }
        }
        Err(RpcError::CorrelationCollision { attempts })
    }

    /// Close the connection, forget subscriptions and reject whatever is
    /// still waiting with `Transport(Closed)`. Idempotent.
    pub async fn shutdown(&self) -> Result<(), RpcError> {
        let result = self.connection.disconnect().await;
        let rejected = self.pending.drain(RpcError::Transport(BusError::Closed));

        info!(rejected_calls = rejected, "Correlation engine shut down");
        result.map_err(RpcError::from)
    }

    /// Current state of the bus connection.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Calls registered and not yet settled.
    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    /// Lifetime counters of the pending call table.
    pub fn pending_stats(&self) -> &PendingStats {
        self.pending.stats()
    }

    /// Whether `topic` has a live subscription on the current session.
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.is_subscribed(topic)
    }

    /// The validated configuration this engine runs with.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }
}

#[async_trait]
impl RpcCaller for CorrelationEngine {
    async fn call(
        &self,
        payload: Value,
        request_topic: &str,
        response_topic: &str,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError> {
        CorrelationEngine::call(self, payload, request_topic, response_topic, timeout).await
    }
}
