use std::future::Future;
use std::sync::atomic::Ordering;

use tokio::time::{MissedTickBehavior, interval};

use crate::error::RelayError;
use crate::metrics::METRICS;
use crate::util;

use super::Collector;

/// Runs the fixed-interval poll loop for one collector.
///
/// This loop:
/// - Ticks at the configured interval (first tick fires immediately)
/// - Runs one fallible step per tick: collect, serialize, publish
/// - Logs step failures and continues with the next cycle
/// - Exits when `shutdown` resolves
///
/// GUARANTEES:
/// - A step failure never terminates the loop; there is no retry,
///   no backoff and no dead-lettering. The next cycle starts on
///   schedule.
/// - On shutdown the loop returns and the collector (with its broker
///   handle) is dropped on this exit path, signal-triggered or not.
///
pub async fn run_collector(
    collector: Collector,
    shutdown: impl Future<Output = ()>,
) -> Result<(), RelayError> {
    log::info!(
        "streaming {} symbols from {} to '{}' every {:?}",
        collector.config().symbols.len(),
        collector.source_name(),
        collector.config().topic,
        collector.config().poll_interval,
    );

    tokio::pin!(shutdown);

    let mut ticker = interval(collector.config().poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("shutdown signal received, stopping collector");
                break;
            }
            _ = ticker.tick() => {
                match step(&collector).await {
                    Ok(published) => {
                        log::info!(
                            "snapshot of {} symbols published at {}",
                            published,
                            util::now_iso()
                        );
                    }
                    Err(e) => {
                        METRICS.publish_errors.fetch_add(1, Ordering::Relaxed);
                        log::error!("poll cycle failed: {}", e);
                    }
                }
            }
        }
    }

    log::info!("collector stopped, broker connection released");
    Ok(())
}

/// One poll cycle.
///
/// Collection itself cannot fail (per-symbol failures are absorbed
/// inside `collect`); everything after it can, and the error is
/// returned to the scheduler above instead of being swallowed here.
async fn step(collector: &Collector) -> Result<usize, RelayError> {
    let snapshot = collector.collect().await;
    collector.publish(&snapshot).await?;

    METRICS.polls_completed.fetch_add(1, Ordering::Relaxed);
    METRICS.snapshots_published.fetch_add(1, Ordering::Relaxed);

    Ok(snapshot.len())
}
