//! Scripted remote responder for the in-memory broker.
//!
//! Stands in for a data-owning service: consumes a request topic and
//! publishes replies on the paired response topic, echoing the request
//! headers so correlation metadata survives the round trip.

use crate::memory::InMemoryBroker;
use crate::message::BusMessage;
use bytes::Bytes;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to a running responder task. Dropping it stops the responder.
pub struct Responder {
    handle: JoinHandle<()>,
    handled: Arc<AtomicU64>,
}

impl Responder {
    /// Reply to each request with the bytes returned by `reply`.
    /// Returning `None` swallows the request.
    pub fn spawn<F>(
        broker: Arc<InMemoryBroker>,
        request_topic: &str,
        response_topic: &str,
        reply: F,
    ) -> Self
    where
        F: Fn(&BusMessage) -> Option<Bytes> + Send + Sync + 'static,
    {
        let mut requests = broker.subscribe(request_topic);
        let response_topic = response_topic.to_string();
        let handled = Arc::new(AtomicU64::new(0));
        let counter = handled.clone();

        let handle = tokio::spawn(async move {
            loop {
                let request = match requests.recv().await {
                    Ok(request) => request,
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                };
                counter.fetch_add(1, Ordering::Relaxed);

                let Some(body) = reply(&request) else {
                    debug!(topic = %request.topic, "Responder swallowed request");
                    continue;
                };
                broker.publish(BusMessage::new(
                    response_topic.clone(),
                    body,
                    request.headers.clone(),
                ));
            }
        });

        Self { handle, handled }
    }

    /// JSON flavour of [`Responder::spawn`]: the closure sees the decoded
    /// request body and returns the JSON reply body.
    pub fn spawn_json<F>(
        broker: Arc<InMemoryBroker>,
        request_topic: &str,
        response_topic: &str,
        reply: F,
    ) -> Self
    where
        F: Fn(Value) -> Option<Value> + Send + Sync + 'static,
    {
        Self::spawn(broker, request_topic, response_topic, move |request| {
            let body = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
            reply(body).map(|value| Bytes::from(value.to_string()))
        })
    }

    /// Requests seen so far, replied to or not.
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
