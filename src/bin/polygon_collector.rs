// ------------------------------------------------------------
// Polygon.io oil & gas collector
// ------------------------------------------------------------
//
// Polls Polygon.io for the symbol list below, publishes one JSON
// snapshot per minute to 'polygon-oil-gas-stream'.
//
// Requires POLYGON_API_KEY in the environment; a missing key is
// fatal before anything connects.
//
use std::sync::Arc;
use std::time::Duration;

use oilgas_stream_relay::broker::RedisStreamBroker;
use oilgas_stream_relay::collector::runner::run_collector;
use oilgas_stream_relay::collector::Collector;
use oilgas_stream_relay::config::{BrokerConfig, CollectorConfig};
use oilgas_stream_relay::metrics;
use oilgas_stream_relay::sources::PolygonSource;
use oilgas_stream_relay::util;

/// Oil and gas related tickers
const SYMBOLS: &[&str] = &[
    "CL.COMM", // Crude Oil
    "NG.COMM", // Natural Gas
    "XOM",     // ExxonMobil
    "CVX",     // Chevron
    "BP",      // BP
    "SHEL",    // Shell
    "RB.COMM", // RBOB Gasoline
    "HO.COMM", // Heating Oil
];

const TOPIC: &str = "polygon-oil-gas-stream";

const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Daily-bar warm-up window fetched once at startup
const HISTORY_DAYS: i64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let source = Arc::new(PolygonSource::from_env()?);

    // --------------------------------------------------------
    // Startup warm-up: recent daily history per symbol.
    // Failures here are per-symbol and non-fatal, the stream
    // starts either way.
    // --------------------------------------------------------
    let from = util::days_ago_string(HISTORY_DAYS);
    let to = util::today_string();
    for symbol in SYMBOLS {
        match source.aggregates(symbol, 1, "day", &from, &to).await {
            Ok(bars) => log::info!("loaded {} daily bars for {}", bars.len(), symbol),
            Err(e) => log::warn!("error collecting historical data for {}: {}", symbol, e),
        }
    }

    let broker = RedisStreamBroker::connect(BrokerConfig::local("polygon-collector")).await?;

    metrics::spawn_reporter(Duration::from_secs(10));

    let collector = Collector::new(
        CollectorConfig::new(TOPIC, SYMBOLS, POLL_INTERVAL),
        source,
        Arc::new(broker),
    );

    run_collector(collector, util::shutdown_signal()).await?;
    Ok(())
}
