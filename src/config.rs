use std::time::Duration;

// ------------------------------------------------------------
// Broker configuration
// ------------------------------------------------------------
//
// Defines how a binary connects to the Redis Streams broker.
//
// Notes:
// - Every binary hardcodes its own instance of this struct;
//   there are no CLI flags.
// - A stream key acts as the topic, a consumer group tracks
//   the committed read position.
//
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Broker address as host:port
    pub address: String,

    /// Consumer group identifier
    pub consumer_group: String,

    /// Where a newly created group starts reading
    pub offset_reset: OffsetReset,

    /// When received messages are acknowledged
    pub delivery: DeliveryGuarantee,

    /// Maximum time one blocking read waits before returning empty,
    /// in milliseconds. Keeps the consume loop responsive to shutdown.
    pub block_ms: u64,
}

impl BrokerConfig {
    /// Broker config for the local development broker.
    ///
    /// The address matches the port-forwarded broker used by all
    /// collector and consumer binaries.
    pub fn local(consumer_group: &str) -> Self {
        Self {
            address: "127.0.0.1:31234".to_string(),
            consumer_group: consumer_group.to_string(),
            offset_reset: OffsetReset::Earliest,
            delivery: DeliveryGuarantee::AtMostOnce,
            block_ms: 1_000,
        }
    }

    /// Connection URL for the redis client.
    pub fn url(&self) -> String {
        format!("redis://{}", self.address)
    }
}

// ------------------------------------------------------------
// Offset reset policy
// ------------------------------------------------------------
//
// Mapped onto the stream group start id:
// - Earliest -> "0"  (read the full stream history)
// - Latest   -> "$"  (read only messages arriving after subscription)
//
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetReset {
    Earliest,
    Latest,
}

impl OffsetReset {
    pub fn start_id(&self) -> &'static str {
        match self {
            OffsetReset::Earliest => "0",
            OffsetReset::Latest => "$",
        }
    }
}

// ------------------------------------------------------------
// Delivery guarantee
// ------------------------------------------------------------
//
// Acknowledgement timing, stated explicitly instead of being left
// to the broker client's auto-commit default:
//
// - AtMostOnce:  acknowledge on receipt, before processing
// - AtLeastOnce: acknowledge only after successful processing
//
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryGuarantee {
    AtMostOnce,
    AtLeastOnce,
}

// ------------------------------------------------------------
// Collector configuration
// ------------------------------------------------------------
//
// Configuration for one polling collector instance.
//
// IMPORTANT:
// - `symbols` is a fixed list; membership never changes at runtime.
// - A snapshot only ever contains symbols from this list.
//
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Topic the serialized snapshots are published to
    pub topic: String,

    /// Tickers queried on every poll cycle
    pub symbols: Vec<String>,

    /// Pause between poll cycles
    pub poll_interval: Duration,
}

impl CollectorConfig {
    pub fn new(topic: &str, symbols: &[&str], poll_interval: Duration) -> Self {
        Self {
            topic: topic.to_string(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            poll_interval,
        }
    }
}
