//! Dispatch loop: routes inbound responses to pending calls.
//!
//! One task reads the session's inbound stream (every subscribed response
//! topic) and settles the matching pending call. Settling is a oneshot send,
//! so routing never waits on what a caller does with its result.

use crate::correlation::CorrelationId;
use crate::envelope::Envelope;
use crate::error::RpcError;
use crate::pending::PendingCallTable;
use gateway_bus::{BusMessage, MessageStream};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Settled a pending call (with data, a remote error or a decode error).
    Delivered,
    /// No correlation header; not a response this engine awaits.
    Uncorrelated,
    /// Correlation header present but not a valid ID.
    Malformed,
    /// No pending call for the ID (late straggler or duplicate delivery).
    Unmatched,
}

pub struct Dispatcher {
    pending: Arc<PendingCallTable>,
    header: String,
}

impl Dispatcher {
    pub fn new(pending: Arc<PendingCallTable>, header: impl Into<String>) -> Self {
        Self {
            pending,
            header: header.into(),
        }
    }

    /// Route messages until the inbound stream ends.
    pub async fn run(self, mut inbound: MessageStream) {
        info!(header = %self.header, "Dispatcher started");

        while let Some(message) = inbound.recv().await {
            self.route(&message);
        }

        warn!("Inbound stream ended, dispatcher stopping");
    }

    pub fn route(&self, message: &BusMessage) -> Routed {
        let Some(raw) = message.header(&self.header) else {
            debug!(topic = %message.topic, "Discarding message without correlation header");
            return Routed::Uncorrelated;
        };

        let id = match CorrelationId::parse(raw) {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    topic = %message.topic,
                    correlation_id = raw,
                    error = %e,
                    "Discarding message with unparseable correlation ID"
                );
                return Routed::Malformed;
            }
        };

        let Some(call) = self.pending.take(&id) else {
            debug!(
                topic = %message.topic,
                correlation_id = %id,
                "Discarding response for unknown or expired correlation ID"
            );
            return Routed::Unmatched;
        };

        let outcome = Envelope::decode(&message.body)
            .and_then(|envelope| envelope.into_result().map_err(RpcError::Remote));

        if let Err(RpcError::Decode(reason)) = &outcome {
            warn!(
                topic = %message.topic,
                correlation_id = %call.id(),
                reason = %reason,
                "Response body is not a valid envelope"
            );
        }

        self.pending.settle(call, outcome);
        Routed::Delivered
    }
}
