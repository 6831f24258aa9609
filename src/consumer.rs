use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::broker::{Broker, BrokerMessage, Subscription};
use crate::config::DeliveryGuarantee;
use crate::error::RelayError;
use crate::metrics::METRICS;
use crate::schema::{QuoteRecord, Snapshot};
use crate::util;

// ------------------------------------------------------------
// RelayConsumer
// ------------------------------------------------------------
//
// Subscribes to one topic and prints every received snapshot as
// human-readable lines. Output on stdout is the deliverable; all
// diagnostics go through the log facade.
//
// Failure policy, per message:
// - decode failure: logged, message skipped, loop continues
// - broker read failure: logged, loop continues
// Nothing a single message contains can terminate the process.
//
pub struct RelayConsumer {
    topic: String,
    delivery: DeliveryGuarantee,
    broker: Arc<dyn Broker>,
}

impl RelayConsumer {
    pub fn new(topic: &str, delivery: DeliveryGuarantee, broker: Arc<dyn Broker>) -> Self {
        Self {
            topic: topic.to_string(),
            delivery,
            broker,
        }
    }

    /// Consume loop: receive, decode, render, print, acknowledge.
    ///
    /// Acknowledgement timing follows the delivery policy:
    /// - AtMostOnce:  commit before processing
    /// - AtLeastOnce: commit only after the message rendered; a
    ///   malformed message stays unacknowledged
    ///
    /// Exits when `shutdown` resolves; the subscription is dropped on
    /// every exit path.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<(), RelayError> {
        let mut subscription = self.broker.subscribe(&self.topic).await?;
        log::info!("starting consumer for '{}'", self.topic);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("shutdown signal received, stopping consumer");
                    break;
                }
                received = subscription.next() => {
                    let message = match received {
                        Ok(Some(message)) => message,
                        // Blocking window elapsed; check shutdown and poll again.
                        Ok(None) => continue,
                        Err(e) => {
                            METRICS.consume_errors.fetch_add(1, Ordering::Relaxed);
                            log::error!("broker read failed: {}", e);
                            continue;
                        }
                    };

                    if self.delivery == DeliveryGuarantee::AtMostOnce {
                        self.commit(&mut *subscription, &message).await;
                    }

                    match render_snapshot(&message.payload) {
                        Ok(lines) => {
                            METRICS.messages_consumed.fetch_add(1, Ordering::Relaxed);
                            println!("\nReceived data at {}:", util::now_iso());
                            for line in lines {
                                println!("{}", line);
                            }
                            if self.delivery == DeliveryGuarantee::AtLeastOnce {
                                self.commit(&mut *subscription, &message).await;
                            }
                        }
                        Err(e) => {
                            METRICS.messages_skipped.fetch_add(1, Ordering::Relaxed);
                            log::warn!("error processing message {}: {}", message.id, e);
                        }
                    }
                }
            }
        }

        log::info!("consumer stopped, subscription released");
        Ok(())
    }

    async fn commit(
        &self,
        subscription: &mut dyn Subscription,
        message: &BrokerMessage,
    ) {
        match subscription.commit(message).await {
            Ok(()) => {
                METRICS.commits.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                log::error!("commit failed for {}: {}", message.id, e);
            }
        }
    }
}

/// Decodes a snapshot payload and renders one line per record.
///
/// A payload that is not a valid snapshot mapping is a
/// `RelayError::Malformed`; the caller decides to skip it.
pub fn render_snapshot(payload: &str) -> Result<Vec<String>, RelayError> {
    let snapshot: Snapshot = serde_json::from_str(payload)?;
    Ok(snapshot.values().map(render_record).collect())
}

/// One console line per quote record.
///
/// Absent numeric fields print as `n/a`; a partially filled record
/// is expected, not an error.
pub fn render_record(record: &QuoteRecord) -> String {
    let price = record
        .last_price
        .or(record.close)
        .map(|p| format!("${:.2}", p))
        .unwrap_or_else(|| "n/a".to_string());

    let change = record
        .change_percent
        .map(|c| format!("{:.2}%", c))
        .unwrap_or_else(|| "n/a".to_string());

    let volume = record
        .volume
        .map(util::format_thousands)
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "{}: Last: {} Change: {} Volume: {}",
        record.symbol, price, change, volume
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(symbol: &str) -> QuoteRecord {
        QuoteRecord::bare(symbol, "2026-08-07T14:00:00+00:00".to_string())
    }

    #[test]
    fn renders_full_record() {
        let mut rec = record("XOM");
        rec.last_price = Some(113.52);
        rec.change_percent = Some(2.1537);
        rec.volume = Some(12_345_678.0);

        assert_eq!(
            render_record(&rec),
            "XOM: Last: $113.52 Change: 2.15% Volume: 12,345,678"
        );
    }

    #[test]
    fn renders_placeholders_for_absent_fields() {
        let rec = record("NG.COMM");
        assert_eq!(
            render_record(&rec),
            "NG.COMM: Last: n/a Change: n/a Volume: n/a"
        );
    }

    #[test]
    fn falls_back_to_close_when_no_last_trade() {
        let mut rec = record("CVX");
        rec.close = Some(95.0);
        assert!(render_record(&rec).starts_with("CVX: Last: $95.00"));
    }

    #[test]
    fn malformed_payload_is_an_error_not_a_panic() {
        assert!(render_snapshot("not json").is_err());
        // Well-formed JSON, wrong shape: record missing required fields.
        assert!(render_snapshot(r#"{"XOM": {"bogus": true}}"#).is_err());
    }

    #[test]
    fn renders_one_line_per_symbol() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("CVX".to_string(), record("CVX"));
        snapshot.insert("XOM".to_string(), record("XOM"));

        let payload = serde_json::to_string(&snapshot).unwrap();
        let lines = render_snapshot(&payload).unwrap();
        assert_eq!(lines.len(), 2);
        // BTreeMap ordering keeps output stable.
        assert!(lines[0].starts_with("CVX:"));
        assert!(lines[1].starts_with("XOM:"));
    }
}
