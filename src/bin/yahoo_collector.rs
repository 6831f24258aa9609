// ------------------------------------------------------------
// Yahoo Finance oil & gas collector
// ------------------------------------------------------------
//
// Polls the keyless Yahoo quote endpoint for the symbol list below,
// publishes one JSON snapshot per minute to 'oil-gas-stream'.
//
use std::sync::Arc;
use std::time::Duration;

use oilgas_stream_relay::broker::RedisStreamBroker;
use oilgas_stream_relay::collector::runner::run_collector;
use oilgas_stream_relay::collector::Collector;
use oilgas_stream_relay::config::{BrokerConfig, CollectorConfig};
use oilgas_stream_relay::metrics;
use oilgas_stream_relay::sources::YahooSource;
use oilgas_stream_relay::util;

/// Oil and gas related tickers
const SYMBOLS: &[&str] = &[
    "CL=F", // Crude Oil Futures
    "BZ=F", // Brent Oil Futures
    "NG=F", // Natural Gas Futures
    "RB=F", // Gasoline Futures
    "XOM",  // ExxonMobil
    "CVX",  // Chevron
    "BP",   // BP
    "SHEL", // Shell
];

const TOPIC: &str = "oil-gas-stream";

const POLL_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let broker = RedisStreamBroker::connect(BrokerConfig::local("yahoo-collector")).await?;

    metrics::spawn_reporter(Duration::from_secs(10));

    let collector = Collector::new(
        CollectorConfig::new(TOPIC, SYMBOLS, POLL_INTERVAL),
        Arc::new(YahooSource::new()),
        Arc::new(broker),
    );

    run_collector(collector, util::shutdown_signal()).await?;
    Ok(())
}
