use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::RelayError;

use super::{Broker, BrokerMessage, Subscription};

/// In-process broker.
///
/// Serves the same role the production broker does, without a network:
/// published messages land in a per-topic log, subscriptions walk that
/// log from the beginning, commits are recorded per topic.
///
/// Used by the integration tests to substitute the real broker, and
/// usable for offline runs where nothing should leave the process.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    /// Append-only message log per topic
    topics: HashMap<String, Vec<BrokerMessage>>,

    /// Acknowledged entry ids per topic
    committed: HashMap<String, Vec<String>>,

    /// Monotonic id source for published entries
    seq: u64,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages ever published to `topic`, in publish order.
    pub async fn messages(&self, topic: &str) -> Vec<BrokerMessage> {
        let state = self.inner.lock().await;
        state.topics.get(topic).cloned().unwrap_or_default()
    }

    /// Number of acknowledged messages on `topic`.
    pub async fn committed(&self, topic: &str) -> usize {
        let state = self.inner.lock().await;
        state.committed.get(topic).map_or(0, |ids| ids.len())
    }
}

#[async_trait::async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), RelayError> {
        let mut state = self.inner.lock().await;
        state.seq += 1;
        let message = BrokerMessage {
            id: format!("0-{}", state.seq),
            key: Some(key.to_string()),
            payload: payload.to_string(),
        };
        state.topics.entry(topic.to_string()).or_default().push(message);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, RelayError> {
        Ok(Box::new(MemorySubscription {
            broker: self.clone(),
            topic: topic.to_string(),
            cursor: 0,
        }))
    }
}

struct MemorySubscription {
    broker: MemoryBroker,
    topic: String,
    /// Index of the next unread entry in the topic log
    cursor: usize,
}

#[async_trait::async_trait]
impl Subscription for MemorySubscription {
    async fn next(&mut self) -> Result<Option<BrokerMessage>, RelayError> {
        {
            let state = self.broker.inner.lock().await;
            if let Some(log) = state.topics.get(&self.topic) {
                if let Some(message) = log.get(self.cursor) {
                    self.cursor += 1;
                    return Ok(Some(message.clone()));
                }
            }
        }

        // Nothing new; emulate one short blocking window.
        sleep(Duration::from_millis(20)).await;
        Ok(None)
    }

    async fn commit(&mut self, message: &BrokerMessage) -> Result<(), RelayError> {
        let mut state = self.broker.inner.lock().await;
        state
            .committed
            .entry(self.topic.clone())
            .or_default()
            .push(message.id.clone());
        Ok(())
    }
}
