//! # Bus Client
//!
//! The operations the gateway consumes from a broker client. A real broker
//! adapter implements [`BusClient`]; [`crate::InMemoryBusClient`] is the
//! in-process implementation.

use crate::message::{BusMessage, Headers};
use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// Errors from bus client operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Operation attempted without a live session.
    #[error("bus client is not connected")]
    NotConnected,

    /// The underlying channel went away.
    #[error("bus channel closed")]
    Closed,

    /// The inbound stream of this session was already handed out.
    #[error("inbound message stream already taken for this session")]
    InboundTaken,

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("subscribe to {topic} failed: {reason}")]
    Subscribe { topic: String, reason: String },
}

pub type BusResult<T> = Result<T, BusError>;

/// Broker client: one publish handle plus one consumer handle.
///
/// Messages from every subscribed topic are delivered on the single stream
/// returned by [`BusClient::messages`].
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Open a session. Connecting an already connected client is a no-op.
    async fn connect(&self) -> BusResult<()>;

    /// Close the session. Disconnecting a disconnected client is a no-op.
    async fn disconnect(&self) -> BusResult<()>;

    /// Publish `body` with `headers` to `topic`.
    async fn publish(&self, topic: &str, body: Bytes, headers: Headers) -> BusResult<()>;

    /// Start consuming `topic` into the session's inbound stream.
    async fn subscribe(&self, topic: &str) -> BusResult<()>;

    /// Hand out the inbound stream of the current session.
    ///
    /// There is exactly one per session; asking twice yields
    /// [`BusError::InboundTaken`].
    fn messages(&self) -> BusResult<MessageStream>;
}

/// Inbound messages of one client session, across all subscribed topics.
#[derive(Debug)]
pub struct MessageStream {
    receiver: mpsc::UnboundedReceiver<BusMessage>,
}

impl MessageStream {
    #[must_use]
    pub fn new(receiver: mpsc::UnboundedReceiver<BusMessage>) -> Self {
        Self { receiver }
    }

    /// Next inbound message, or `None` once the session is gone.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.receiver.recv().await
    }
}

impl Stream for MessageStream {
    type Item = BusMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
