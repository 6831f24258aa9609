use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamReadOptions, StreamReadReply};

use crate::config::BrokerConfig;
use crate::error::RelayError;

use super::{Broker, BrokerMessage, Subscription};

/// Field name carrying the producer key inside a stream entry.
const FIELD_KEY: &str = "key";
/// Field name carrying the JSON payload inside a stream entry.
const FIELD_PAYLOAD: &str = "payload";

// ------------------------------------------------------------
// RedisStreamBroker
// ------------------------------------------------------------
//
// Production broker backed by Redis Streams.
//
// Mapping:
// - topic          -> stream key
// - publish        -> XADD <topic> * key <k> payload <json>
// - consumer group -> XGROUP CREATE <topic> <group> <start> MKSTREAM
// - receive        -> XREADGROUP ... BLOCK <ms> STREAMS <topic> >
// - commit         -> XACK <topic> <group> <id>
//
// The multiplexed connection is cheap to clone; each subscription
// holds its own handle so reads never contend with publishes.
//
pub struct RedisStreamBroker {
    conn: MultiplexedConnection,
    cfg: BrokerConfig,
}

impl RedisStreamBroker {
    /// Connects to the broker named in `cfg`.
    ///
    /// Connection failures here are startup failures; the binaries
    /// treat them as fatal.
    pub async fn connect(cfg: BrokerConfig) -> Result<Self, RelayError> {
        let client = redis::Client::open(cfg.url())?;
        let conn = client.get_multiplexed_async_connection().await?;
        log::info!("connected to broker at {}", cfg.address);
        Ok(Self { conn, cfg })
    }
}

#[async_trait::async_trait]
impl Broker for RedisStreamBroker {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), RelayError> {
        let mut conn = self.conn.clone();
        let _id: String = conn
            .xadd(topic, "*", &[(FIELD_KEY, key), (FIELD_PAYLOAD, payload)])
            .await?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, RelayError> {
        let mut conn = self.conn.clone();
        let group = self.cfg.consumer_group.clone();
        let start = self.cfg.offset_reset.start_id();

        // Creating a group that already exists answers BUSYGROUP;
        // that is the normal restart path, not an error.
        let created: redis::RedisResult<()> =
            conn.xgroup_create_mkstream(topic, &group, start).await;
        if let Err(e) = created {
            if e.code() != Some("BUSYGROUP") {
                return Err(e.into());
            }
        }

        // Consumer names must be unique per process so a restarted
        // consumer does not inherit another's pending entries.
        let consumer = format!("{}-{:08x}", group, rand::random::<u32>());
        log::info!("subscribed to '{}' as {}/{}", topic, group, consumer);

        Ok(Box::new(RedisSubscription {
            conn,
            topic: topic.to_string(),
            group,
            consumer,
            block_ms: self.cfg.block_ms,
        }))
    }
}

struct RedisSubscription {
    conn: MultiplexedConnection,
    topic: String,
    group: String,
    consumer: String,
    block_ms: u64,
}

#[async_trait::async_trait]
impl Subscription for RedisSubscription {
    async fn next(&mut self) -> Result<Option<BrokerMessage>, RelayError> {
        let opts = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .block(self.block_ms as usize)
            .count(1);

        let reply: StreamReadReply = self
            .conn
            .xread_options(&[self.topic.as_str()], &[">"], &opts)
            .await?;

        for stream in reply.keys {
            for entry in stream.ids {
                let key: Option<String> = entry.get(FIELD_KEY);
                let payload: String = entry.get(FIELD_PAYLOAD).unwrap_or_default();
                return Ok(Some(BrokerMessage {
                    id: entry.id.clone(),
                    key,
                    payload,
                }));
            }
        }

        // Blocking window elapsed without a delivery.
        Ok(None)
    }

    async fn commit(&mut self, message: &BrokerMessage) -> Result<(), RelayError> {
        let _acked: i64 = self
            .conn
            .xack(&self.topic, &self.group, &[message.id.as_str()])
            .await?;
        Ok(())
    }
}

// TODO: recover pending entries of dead consumers via XAUTOCLAIM.
