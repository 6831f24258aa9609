//! Broker abstraction.
//!
//! The relay talks to the message broker exclusively through the
//! `Broker` and `Subscription` traits. Two implementations exist:
//!
//! - `redis_stream`: the production broker (Redis Streams)
//! - `memory`: an in-process broker for tests and offline runs
//!
//! Broker internals (persistence, trimming, group rebalancing) are
//! the broker's own concern and are not modeled here.

pub mod memory;
pub mod redis_stream;

pub use memory::MemoryBroker;
pub use redis_stream::RedisStreamBroker;

use crate::error::RelayError;

/// One message as delivered by a subscription.
#[derive(Debug, Clone)]
pub struct BrokerMessage {
    /// Broker-assigned entry id, used for acknowledgement
    pub id: String,

    /// Producer-supplied key (epoch seconds for snapshots,
    /// record id for smoke events)
    pub key: Option<String>,

    /// JSON-encoded value
    pub payload: String,
}

/// Publish / subscribe seam between the relay and the broker client.
///
/// CONTRACT:
/// - `publish` appends one message to the topic and returns once the
///   broker has accepted it. No batching, no buffering.
/// - `subscribe` binds the configured consumer group to the topic and
///   returns a live subscription.
/// - Implementations must not panic on broker failures; every failure
///   surfaces as `RelayError::Broker`.
#[async_trait::async_trait]
pub trait Broker: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), RelayError>;

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, RelayError>;
}

/// A live read position inside one topic.
///
/// CONTRACT:
/// - `next` waits at most one blocking window and returns
///   `Ok(None)` when no message arrived in it. Callers loop.
/// - `commit` acknowledges exactly one previously received message.
///   When it is called is a delivery-guarantee decision made by the
///   consumer, not by the subscription.
#[async_trait::async_trait]
pub trait Subscription: Send {
    async fn next(&mut self) -> Result<Option<BrokerMessage>, RelayError>;

    async fn commit(&mut self, message: &BrokerMessage) -> Result<(), RelayError>;
}
