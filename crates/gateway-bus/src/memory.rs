//! # In-Memory Broker
//!
//! Uses `tokio::sync::broadcast` per topic for multi-producer, multi-consumer
//! semantics. Suitable for single-process operation and tests; distributed
//! deployments plug a real broker client in behind [`BusClient`].
//!
//! Consumers start from the latest message: anything published to a topic
//! before a consumer subscribed is not replayed to it.

use crate::client::{BusClient, BusError, BusResult, MessageStream};
use crate::config::BusConfig;
use crate::message::{BusMessage, Headers};
use crate::DEFAULT_TOPIC_CAPACITY;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Topic-addressed broadcast broker shared by every in-memory client.
pub struct InMemoryBroker {
    /// One broadcast channel per topic, created lazily.
    topics: RwLock<HashMap<String, broadcast::Sender<BusMessage>>>,

    /// Consumers ever attached, by topic.
    subscriptions: RwLock<HashMap<String, usize>>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Channel capacity per topic.
    capacity: usize,
}

impl InMemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }

    #[must_use]
    pub fn with_config(config: &BusConfig) -> Self {
        Self::with_capacity(config.topic_capacity)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            messages_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    fn sender_for(&self, topic: &str) -> broadcast::Sender<BusMessage> {
        if let Some(sender) = self.topics.read().get(topic) {
            return sender.clone();
        }
        self.topics
            .write()
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Attach a new consumer to `topic`.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<BusMessage> {
        let receiver = self.sender_for(topic).subscribe();
        *self
            .subscriptions
            .write()
            .entry(topic.to_string())
            .or_insert(0) += 1;
        debug!(topic = topic, "Broker consumer attached");
        receiver
    }

    /// Publish a message, returning how many consumers received it.
    pub fn publish(&self, message: BusMessage) -> usize {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        let topic = message.topic.clone();

        match self.sender_for(&topic).send(message) {
            Ok(receivers) => {
                debug!(topic = %topic, receivers = receivers, "Message published");
                receivers
            }
            Err(_) => {
                debug!(topic = %topic, "Message dropped (no consumers)");
                0
            }
        }
    }

    pub fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }

    /// Consumers ever attached to `topic`.
    pub fn subscriptions_opened(&self, topic: &str) -> usize {
        self.subscriptions.read().get(topic).copied().unwrap_or(0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// State of one connected session.
struct Session {
    inbound_tx: mpsc::UnboundedSender<BusMessage>,
    inbound_rx: Option<mpsc::UnboundedReceiver<BusMessage>>,
    forwarders: Vec<JoinHandle<()>>,
}

impl Session {
    fn open() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            inbound_tx,
            inbound_rx: Some(inbound_rx),
            forwarders: Vec::new(),
        }
    }

    fn close(self) {
        for forwarder in self.forwarders {
            forwarder.abort();
        }
    }
}

/// Failure injection knobs, all off by default.
#[derive(Default)]
struct Faults {
    connect_failures: AtomicUsize,
    subscribe_failures: AtomicUsize,
    publish_failure: AtomicBool,
}

impl Faults {
    fn consume(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// [`BusClient`] backed by an [`InMemoryBroker`].
///
/// Subscribing the same topic twice attaches two consumers, so a duplicate
/// subscription shows up as duplicate delivery, as with a real broker.
pub struct InMemoryBusClient {
    broker: Arc<InMemoryBroker>,
    client_id: String,
    session: Mutex<Option<Session>>,
    connects: AtomicU64,
    subscribe_calls: Mutex<HashMap<String, usize>>,
    faults: Faults,
}

impl InMemoryBusClient {
    pub fn new(broker: Arc<InMemoryBroker>) -> Self {
        Self::with_config(broker, &BusConfig::default())
    }

    pub fn with_config(broker: Arc<InMemoryBroker>, config: &BusConfig) -> Self {
        Self {
            broker,
            client_id: config.client_id.clone(),
            session: Mutex::new(None),
            connects: AtomicU64::new(0),
            subscribe_calls: Mutex::new(HashMap::new()),
            faults: Faults::default(),
        }
    }

    pub fn broker(&self) -> &Arc<InMemoryBroker> {
        &self.broker
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_connected(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Sessions opened so far.
    pub fn connect_count(&self) -> u64 {
        self.connects.load(Ordering::Relaxed)
    }

    /// Successful `subscribe` calls for `topic`, across sessions.
    pub fn subscribe_count(&self, topic: &str) -> usize {
        self.subscribe_calls.lock().get(topic).copied().unwrap_or(0)
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: usize) {
        self.faults.connect_failures.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` subscribe attempts fail.
    pub fn fail_next_subscribes(&self, n: usize) {
        self.faults.subscribe_failures.store(n, Ordering::SeqCst);
    }

    /// Make every publish fail while set.
    pub fn fail_publishes(&self, fail: bool) {
        self.faults.publish_failure.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BusClient for InMemoryBusClient {
    async fn connect(&self) -> BusResult<()> {
        if Faults::consume(&self.faults.connect_failures) {
            warn!(client_id = %self.client_id, "Injected connect failure");
            return Err(BusError::Connect("broker unreachable".into()));
        }

        let mut session = self.session.lock();
        if session.is_none() {
            *session = Some(Session::open());
            self.connects.fetch_add(1, Ordering::Relaxed);
            debug!(client_id = %self.client_id, "In-memory session opened");
        }
        Ok(())
    }

    async fn disconnect(&self) -> BusResult<()> {
        if let Some(session) = self.session.lock().take() {
            session.close();
            debug!(client_id = %self.client_id, "In-memory session closed");
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, body: Bytes, headers: Headers) -> BusResult<()> {
        if self.faults.publish_failure.load(Ordering::SeqCst) {
            return Err(BusError::Publish {
                topic: topic.to_string(),
                reason: "injected failure".into(),
            });
        }
        if self.session.lock().is_none() {
            return Err(BusError::NotConnected);
        }

        self.broker.publish(BusMessage::new(topic, body, headers));
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> BusResult<()> {
        if Faults::consume(&self.faults.subscribe_failures) {
            return Err(BusError::Subscribe {
                topic: topic.to_string(),
                reason: "injected failure".into(),
            });
        }

        let mut guard = self.session.lock();
        let session = guard.as_mut().ok_or(BusError::NotConnected)?;

        // Attach before returning so nothing published afterwards is missed.
        let receiver = self.broker.subscribe(topic);
        let inbound = session.inbound_tx.clone();
        session
            .forwarders
            .push(tokio::spawn(forward(topic.to_string(), receiver, inbound)));
        drop(guard);

        *self
            .subscribe_calls
            .lock()
            .entry(topic.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    fn messages(&self) -> BusResult<MessageStream> {
        let mut guard = self.session.lock();
        let session = guard.as_mut().ok_or(BusError::NotConnected)?;
        session
            .inbound_rx
            .take()
            .map(MessageStream::new)
            .ok_or(BusError::InboundTaken)
    }
}

/// Pump one topic's broadcast receiver into the session inbound stream.
async fn forward(
    topic: String,
    mut receiver: broadcast::Receiver<BusMessage>,
    inbound: mpsc::UnboundedSender<BusMessage>,
) {
    loop {
        match receiver.recv().await {
            Ok(message) => {
                if inbound.send(message).is_err() {
                    debug!(topic = %topic, "Inbound stream dropped, forwarder stopping");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Closed) => break,
            Err(broadcast::error::RecvError::Lagged(count)) => {
                warn!(topic = %topic, lagged = count, "Consumer lagged, messages dropped");
            }
        }
    }
}
