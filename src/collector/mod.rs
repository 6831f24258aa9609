//! Poll-collect-publish runtime.
//!
//! `Collector` owns one cycle's work (query every symbol, build the
//! snapshot, publish it); `runner` owns the schedule (when cycles
//! run, what happens on failure, when the loop stops).

pub mod runner;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::broker::Broker;
use crate::config::CollectorConfig;
use crate::error::RelayError;
use crate::metrics::METRICS;
use crate::schema::Snapshot;
use crate::sources::MarketSource;
use crate::util;

/// One polling collector: a fixed symbol list, a market-data source
/// and a broker topic.
///
/// The source and the broker are injected; tests substitute both.
pub struct Collector {
    cfg: CollectorConfig,
    source: Arc<dyn MarketSource>,
    broker: Arc<dyn Broker>,
}

impl Collector {
    pub fn new(
        cfg: CollectorConfig,
        source: Arc<dyn MarketSource>,
        broker: Arc<dyn Broker>,
    ) -> Self {
        Self { cfg, source, broker }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.cfg
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Queries the source once per configured symbol and assembles
    /// the snapshot.
    ///
    /// CONTRACT:
    /// - A per-symbol failure is logged and the symbol is omitted;
    ///   the cycle never aborts.
    /// - The returned symbol set is always a subset of the configured
    ///   list; a symbol is absent exactly when its query failed.
    pub async fn collect(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();

        for symbol in &self.cfg.symbols {
            match self.source.fetch_quote(symbol).await {
                Ok(record) => {
                    METRICS.symbols_collected.fetch_add(1, Ordering::Relaxed);
                    snapshot.insert(symbol.clone(), record);
                }
                Err(e) => {
                    METRICS.symbols_failed.fetch_add(1, Ordering::Relaxed);
                    log::warn!("error collecting data for {}: {}", symbol, e);
                }
            }
        }

        snapshot
    }

    /// Serializes the snapshot and publishes it under an
    /// epoch-seconds key.
    pub async fn publish(&self, snapshot: &Snapshot) -> Result<(), RelayError> {
        let payload = serde_json::to_string(snapshot)?;
        self.broker
            .publish(&self.cfg.topic, &util::epoch_key(), &payload)
            .await
    }
}
