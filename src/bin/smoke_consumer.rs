// ------------------------------------------------------------
// Broker smoke test: consumer
// ------------------------------------------------------------
//
// Prints every raw message arriving on 'my_topic'. Runs with the
// at-least-once policy: a message is acknowledged only after it
// has been printed.
//
use oilgas_stream_relay::broker::{Broker, RedisStreamBroker, Subscription};
use oilgas_stream_relay::config::{BrokerConfig, DeliveryGuarantee};
use oilgas_stream_relay::util;

const TOPIC: &str = "my_topic";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut cfg = BrokerConfig::local("example-consumer");
    cfg.delivery = DeliveryGuarantee::AtLeastOnce;

    let broker = RedisStreamBroker::connect(cfg).await?;
    let mut subscription = broker.subscribe(TOPIC).await?;

    let shutdown = util::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            received = subscription.next() => {
                match received {
                    Ok(Some(message)) => {
                        println!("Received message: {}", message.payload);
                        if let Err(e) = subscription.commit(&message).await {
                            log::error!("commit failed for {}: {}", message.id, e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => log::error!("broker read failed: {}", e),
                }
            }
        }
    }

    log::info!("consumer stopped, subscription released");
    Ok(())
}
