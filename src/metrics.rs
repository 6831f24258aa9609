use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use once_cell::sync::Lazy;
use tokio::time::sleep;

/// Global runtime metrics for the relay.
///
/// Purpose:
/// - Track poll cycles and per-symbol outcomes
/// - Track publish / consume throughput and failures
///
/// Design:
/// - Lock-free (Atomics)
/// - Cheap to update
/// - Safe in async + multithreaded contexts
#[derive(Default)]
pub struct RuntimeMetrics {
    // Collector side
    pub polls_completed: AtomicUsize,
    pub symbols_collected: AtomicUsize,
    pub symbols_failed: AtomicUsize,
    pub snapshots_published: AtomicUsize,
    pub publish_errors: AtomicUsize,

    // Consumer side
    pub messages_consumed: AtomicUsize,
    pub messages_skipped: AtomicUsize,
    pub consume_errors: AtomicUsize,
    pub commits: AtomicUsize,
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> =
    Lazy::new(|| Arc::new(RuntimeMetrics::default()));

/// Starts the periodic, low-noise metrics reporter.
///
/// One line every `interval`, via the log facade so it can be
/// silenced with RUST_LOG like everything else.
pub fn spawn_reporter(interval: Duration) {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;

            log::info!(
                "[METRICS] polls={} ok={} failed={} published={} pub_err={} consumed={} skipped={} cons_err={} commits={}",
                METRICS.polls_completed.load(Ordering::Relaxed),
                METRICS.symbols_collected.load(Ordering::Relaxed),
                METRICS.symbols_failed.load(Ordering::Relaxed),
                METRICS.snapshots_published.load(Ordering::Relaxed),
                METRICS.publish_errors.load(Ordering::Relaxed),
                METRICS.messages_consumed.load(Ordering::Relaxed),
                METRICS.messages_skipped.load(Ordering::Relaxed),
                METRICS.consume_errors.load(Ordering::Relaxed),
                METRICS.commits.load(Ordering::Relaxed),
            );
        }
    });
}
