// ------------------------------------------------------------
// Broker smoke test: producer
// ------------------------------------------------------------
//
// Publishes one fixed event per second to 'my_topic'. Used only to
// verify broker connectivity; no market data involved.
//
use std::time::Duration;

use oilgas_stream_relay::broker::{Broker, RedisStreamBroker};
use oilgas_stream_relay::config::BrokerConfig;
use oilgas_stream_relay::util;

const TOPIC: &str = "my_topic";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let broker = RedisStreamBroker::connect(BrokerConfig::local("example")).await?;

    let event = serde_json::json!({
        "id": "1",
        "text": "Lorem ipsum dolor sit amet",
    });
    let payload = event.to_string();

    let shutdown = util::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                match broker.publish(TOPIC, "1", &payload).await {
                    Ok(()) => log::info!("event published to '{}'", TOPIC),
                    Err(e) => log::error!("publish failed: {}", e),
                }
            }
        }
    }

    log::info!("producer stopped, broker connection released");
    Ok(())
}
