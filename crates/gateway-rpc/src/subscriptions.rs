//! Topic Subscription Registry.
//!
//! Each response topic gets one `OnceCell`. Concurrent callers for the same
//! topic wait on the same cell, so the broker sees a single subscribe; a
//! failed subscribe leaves the cell empty and the next caller retries.
//! Different topics never wait on each other.

use dashmap::DashMap;
use gateway_bus::{BusClient, BusError};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub struct SubscriptionRegistry {
    client: Arc<dyn BusClient>,
    topics: DashMap<String, Arc<OnceCell<()>>>,
}

impl SubscriptionRegistry {
    pub fn new(client: Arc<dyn BusClient>) -> Self {
        Self {
            client,
            topics: DashMap::new(),
        }
    }

    /// Subscribe to `topic` unless a subscription is already live.
    pub async fn ensure_subscribed(&self, topic: &str) -> Result<(), BusError> {
        // Clone the cell out so no map guard is held across the await.
        let cell = self.topics.entry(topic.to_string()).or_default().clone();

        cell.get_or_try_init(|| async {
            match self.client.subscribe(topic).await {
                Ok(()) => {
                    info!(topic = topic, "Subscribed to response topic");
                    Ok(())
                }
                Err(e) => {
                    warn!(topic = topic, error = %e, "Subscribe failed");
                    Err(e)
                }
            }
        })
        .await
        .map(|_| ())
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.topics
            .get(topic)
            .is_some_and(|cell| cell.initialized())
    }

    pub fn subscribed_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .topics
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect();
        topics.sort();
        topics
    }

    /// Forget every subscription; used when the session they lived on closes.
    pub fn clear(&self) {
        self.topics.clear();
    }
}
