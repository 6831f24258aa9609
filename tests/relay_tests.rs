//! End-to-end relay tests against the in-process broker.
//!
//! A fake market source stands in for the REST adapters so the
//! collector, schema and consumer paths run without a network.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use oilgas_stream_relay::broker::{Broker, MemoryBroker};
use oilgas_stream_relay::collector::Collector;
use oilgas_stream_relay::config::{CollectorConfig, DeliveryGuarantee};
use oilgas_stream_relay::consumer::{RelayConsumer, render_snapshot};
use oilgas_stream_relay::error::RelayError;
use oilgas_stream_relay::schema::{QuoteRecord, Snapshot};
use oilgas_stream_relay::sources::MarketSource;
use oilgas_stream_relay::util;

const TOPIC: &str = "test-stream";

/// Market source with canned quotes and simulated outages.
struct FakeSource {
    quotes: HashMap<String, QuoteRecord>,
    failing: HashSet<String>,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            quotes: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    fn with_quote(mut self, symbol: &str, price: f64, previous_close: f64) -> Self {
        let mut record = QuoteRecord::bare(symbol, util::now_iso());
        record.last_price = Some(price);
        record.previous_close = Some(previous_close);
        record.change_percent = util::change_percent(Some(price), Some(previous_close));
        self.quotes.insert(symbol.to_string(), record);
        self
    }

    fn with_outage(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }
}

#[async_trait::async_trait]
impl MarketSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, RelayError> {
        if self.failing.contains(symbol) {
            return Err(RelayError::upstream(symbol, "simulated outage"));
        }
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| RelayError::upstream(symbol, "unknown symbol"))
    }
}

fn collector_for(source: FakeSource, symbols: &[&str], broker: &MemoryBroker) -> Collector {
    Collector::new(
        CollectorConfig::new(TOPIC, symbols, Duration::from_secs(60)),
        Arc::new(source),
        Arc::new(broker.clone()),
    )
}

#[tokio::test]
async fn snapshot_change_percent_matches_expected_values() {
    let source = FakeSource::new()
        .with_quote("XOM", 100.0, 90.0)
        .with_quote("CVX", 95.0, 100.0);
    let broker = MemoryBroker::new();
    let collector = collector_for(source, &["XOM", "CVX"], &broker);

    let snapshot = collector.collect().await;

    let xom = snapshot["XOM"].change_percent.unwrap();
    assert!((xom - 11.11).abs() < 0.01);
    assert_eq!(snapshot["CVX"].change_percent, Some(-5.0));
}

#[tokio::test]
async fn zero_previous_close_yields_null_change() {
    let source = FakeSource::new().with_quote("CL.COMM", 72.0, 0.0);
    let broker = MemoryBroker::new();
    let collector = collector_for(source, &["CL.COMM"], &broker);

    let snapshot = collector.collect().await;
    assert_eq!(snapshot["CL.COMM"].change_percent, None);
}

#[tokio::test]
async fn failing_symbol_is_omitted_not_fatal() {
    let source = FakeSource::new()
        .with_quote("XOM", 100.0, 90.0)
        .with_quote("BP", 34.0, 33.0)
        .with_outage("CVX");
    let broker = MemoryBroker::new();
    let collector = collector_for(source, &["XOM", "CVX", "BP"], &broker);

    let snapshot = collector.collect().await;

    let symbols: Vec<&String> = snapshot.keys().collect();
    assert_eq!(symbols, vec!["BP", "XOM"]);
}

#[tokio::test]
async fn published_snapshot_round_trips_and_renders() {
    let source = FakeSource::new()
        .with_quote("XOM", 100.0, 90.0)
        .with_quote("CVX", 95.0, 100.0);
    let broker = MemoryBroker::new();
    let collector = collector_for(source, &["XOM", "CVX"], &broker);

    let snapshot = collector.collect().await;
    collector.publish(&snapshot).await.unwrap();

    let messages = broker.messages(TOPIC).await;
    assert_eq!(messages.len(), 1);

    // Round trip: the published payload decodes to an equal mapping.
    let decoded: Snapshot = serde_json::from_str(&messages[0].payload).unwrap();
    assert_eq!(decoded, snapshot);

    let lines = render_snapshot(&messages[0].payload).unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("CVX: Last: $95.00 Change: -5.00%"));
    assert!(lines[1].starts_with("XOM: Last: $100.00 Change: 11.11%"));
}

#[tokio::test]
async fn consumer_survives_malformed_message() {
    let broker = MemoryBroker::new();
    broker.publish(TOPIC, "k1", "{not valid json").await.unwrap();

    let source = FakeSource::new().with_quote("XOM", 100.0, 90.0);
    let collector = collector_for(source, &["XOM"], &broker);
    let snapshot = collector.collect().await;
    collector.publish(&snapshot).await.unwrap();

    let consumer = RelayConsumer::new(
        TOPIC,
        DeliveryGuarantee::AtMostOnce,
        Arc::new(broker.clone()),
    );
    // The consumer must outlive the bad message and keep reading.
    consumer.run(sleep(Duration::from_millis(300))).await.unwrap();

    // Both messages were acknowledged on receipt, bad one included.
    assert_eq!(broker.committed(TOPIC).await, 2);
}

#[tokio::test]
async fn at_least_once_leaves_malformed_message_unacknowledged() {
    let broker = MemoryBroker::new();
    broker.publish(TOPIC, "k1", "{not valid json").await.unwrap();

    let source = FakeSource::new().with_quote("XOM", 100.0, 90.0);
    let collector = collector_for(source, &["XOM"], &broker);
    let snapshot = collector.collect().await;
    collector.publish(&snapshot).await.unwrap();

    let consumer = RelayConsumer::new(
        TOPIC,
        DeliveryGuarantee::AtLeastOnce,
        Arc::new(broker.clone()),
    );
    consumer.run(sleep(Duration::from_millis(300))).await.unwrap();

    // Only the message that rendered successfully was committed.
    assert_eq!(broker.committed(TOPIC).await, 1);
}
