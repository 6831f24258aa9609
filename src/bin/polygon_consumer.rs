// ------------------------------------------------------------
// Polygon.io stream consumer
// ------------------------------------------------------------
//
// Reads snapshots from 'polygon-oil-gas-stream' and prints one
// formatted line per symbol. Messages are acknowledged on receipt
// (at-most-once).
//
use std::sync::Arc;

use oilgas_stream_relay::broker::RedisStreamBroker;
use oilgas_stream_relay::config::BrokerConfig;
use oilgas_stream_relay::consumer::RelayConsumer;
use oilgas_stream_relay::util;

const TOPIC: &str = "polygon-oil-gas-stream";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cfg = BrokerConfig::local("polygon-consumer");
    let broker = RedisStreamBroker::connect(cfg.clone()).await?;

    let consumer = RelayConsumer::new(TOPIC, cfg.delivery, Arc::new(broker));
    consumer.run(util::shutdown_signal()).await?;
    Ok(())
}
