/// Utility helpers used by collectors and consumers.
///
/// This module contains:
/// - Time helpers (ISO-8601 stamps, epoch keys, query dates)
/// - The change-percent computation
/// - Console formatting helpers
///
/// IMPORTANT:
/// - No source-specific business logic should live here.
/// - This module must remain lightweight and deterministic.
///
use chrono::{Duration as ChronoDuration, Utc};

/// Current wall-clock time as an ISO-8601 string.
///
/// Used as the `timestamp` field of every quote record and in the
/// consumer's per-message header line.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Current Unix time in whole seconds, as a string.
///
/// Used as the message key for published snapshots.
pub fn epoch_key() -> String {
    Utc::now().timestamp().to_string()
}

/// Today's date formatted for the daily open/close endpoint (YYYY-MM-DD).
pub fn today_string() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// The date `days` days ago, formatted as YYYY-MM-DD.
pub fn days_ago_string(days: i64) -> String {
    (Utc::now() - ChronoDuration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

/// Percentage change of `current` versus `previous`.
///
/// CONTRACT:
/// - Returns None unless both values are present.
/// - Returns None when `previous` is zero; the division is never
///   performed with a zero denominator.
pub fn change_percent(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(cur), Some(prev)) if prev != 0.0 => Some((cur - prev) / prev * 100.0),
        _ => None,
    }
}

/// Group the integer part of a non-negative number with thousands
/// separators, e.g. 12345678.0 -> "12,345,678".
///
/// Fractional parts are dropped; volumes are reported as whole units.
pub fn format_thousands(value: f64) -> String {
    let whole = value.trunc().abs() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value.is_sign_negative() && whole > 0 {
        out.insert(0, '-');
    }
    out
}

/// Resolves when the process receives Ctrl-C.
///
/// Every runtime loop selects on this future so broker connections
/// are released on the signal path as well, not only on clean returns.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", e);
        // Fall through: the loop keeps running until killed externally.
        std::future::pending::<()>().await;
    }
}
