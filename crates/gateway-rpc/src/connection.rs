//! Transport connection lifecycle.
//!
//! ```text
//! Disconnected ──ensure_connected()──→ Connecting ──ok──→ Connected
//!       ↑                                  │                  │
//!       └──────────────err─────────────────┘        disconnect() or
//!       ↑                                          inbound stream ends
//!       └─────────────────── Disconnecting ←──────────────────┘
//! ```
//!
//! Transitions happen only while holding the session lock, so exactly one
//! task ever connects or disconnects; the others wait and then observe the
//! outcome. A live session owns the dispatcher task reading its inbound
//! stream. Subscriptions belong to the session: every way out of
//! `Connected` forgets them under that same lock.

use crate::dispatch::Dispatcher;
use crate::error::RpcError;
use crate::pending::PendingCallTable;
use crate::subscriptions::SubscriptionRegistry;
use gateway_bus::{BusClient, BusError};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// A live session: its number and the dispatcher reading its stream.
struct Session {
    epoch: u64,
    dispatcher: JoinHandle<()>,
}

struct Shared {
    client: Arc<dyn BusClient>,
    pending: Arc<PendingCallTable>,
    subscriptions: Arc<SubscriptionRegistry>,
    header: String,
    state: RwLock<ConnectionState>,
    /// The mutex serializes transitions.
    session: Mutex<Option<Session>>,
    epochs: AtomicU64,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.write() = next;
    }

    /// Called by the dispatcher task once its inbound stream is gone.
    ///
    /// A stale epoch means the session was already closed (and perhaps
    /// replaced) through [`Connection::disconnect`]; nothing to do then.
    async fn session_ended(&self, epoch: u64) {
        let mut session = self.session.lock().await;
        match &*session {
            Some(live) if live.epoch == epoch => {}
            _ => return,
        }
        session.take();

        self.set_state(ConnectionState::Disconnecting);
        self.subscriptions.clear();
        if let Err(e) = self.client.disconnect().await {
            warn!(error = %e, "Disconnect after lost session reported an error");
        }
        let rejected = self.pending.drain(RpcError::Transport(BusError::Closed));
        self.set_state(ConnectionState::Disconnected);

        warn!(
            rejected_calls = rejected,
            "Bus session lost, next call reconnects"
        );
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(live) = self.session.get_mut().take() {
            live.dispatcher.abort();
        }
    }
}

pub struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    pub fn new(
        client: Arc<dyn BusClient>,
        pending: Arc<PendingCallTable>,
        subscriptions: Arc<SubscriptionRegistry>,
        header: impl Into<String>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                client,
                pending,
                subscriptions,
                header: header.into(),
                state: RwLock::new(ConnectionState::Disconnected),
                session: Mutex::new(None),
                epochs: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Connect unless already connected.
    ///
    /// Concurrent first callers share a single connect attempt. On failure
    /// the connection is back in `Disconnected` and the next call retries.
    pub async fn ensure_connected(&self) -> Result<(), BusError> {
        let shared = &self.shared;
        if shared.state() == ConnectionState::Connected {
            return Ok(());
        }

        let mut session = shared.session.lock().await;
        if shared.state() == ConnectionState::Connected {
            return Ok(());
        }

        shared.set_state(ConnectionState::Connecting);
        if let Err(e) = shared.client.connect().await {
            shared.set_state(ConnectionState::Disconnected);
            error!(error = %e, "Bus connect failed");
            return Err(e);
        }

        let inbound = match shared.client.messages() {
            Ok(inbound) => inbound,
            Err(e) => {
                // Do not leave a session behind that nobody is reading.
                if let Err(close_err) = shared.client.disconnect().await {
                    warn!(error = %close_err, "Disconnect after failed session setup also failed");
                }
                shared.set_state(ConnectionState::Disconnected);
                error!(error = %e, "Bus session has no inbound stream");
                return Err(e);
            }
        };

        let epoch = shared.epochs.fetch_add(1, Ordering::Relaxed) + 1;
        let dispatcher = Dispatcher::new(shared.pending.clone(), shared.header.clone());
        let owner = Arc::downgrade(&self.shared);
        *session = Some(Session {
            epoch,
            dispatcher: tokio::spawn(async move {
                dispatcher.run(inbound).await;
                if let Some(owner) = owner.upgrade() {
                    owner.session_ended(epoch).await;
                }
            }),
        });
        shared.set_state(ConnectionState::Connected);

        info!(session = epoch, "Bus connection established");
        Ok(())
    }

    /// Close the session and forget its subscriptions. Idempotent.
    pub async fn disconnect(&self) -> Result<(), BusError> {
        let shared = &self.shared;
        let mut session = shared.session.lock().await;
        if shared.state() == ConnectionState::Disconnected {
            return Ok(());
        }

        shared.set_state(ConnectionState::Disconnecting);
        if let Some(live) = session.take() {
            live.dispatcher.abort();
        }
        shared.subscriptions.clear();
        let result = shared.client.disconnect().await;
        shared.set_state(ConnectionState::Disconnected);

        match &result {
            Ok(()) => info!("Bus connection closed"),
            Err(e) => warn!(error = %e, "Bus disconnect reported an error"),
        }
        result
    }
}
