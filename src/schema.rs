use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One collection cycle produces a full symbol -> record mapping.
///
/// A snapshot is created at poll time, serialized, published and
/// discarded. There is no retained history across cycles and no
/// deduplication; ordering beyond the broker's own per-stream order
/// is not guaranteed.
pub type Snapshot = BTreeMap<String, QuoteRecord>;

// ------------------------------------------------------------
// Quote record
// ------------------------------------------------------------
//
// Unified record shape for both market-data sources.
//
// - The Polygon source fills the OHLCV fields from the daily
//   open/close endpoint plus the last-trade fields.
// - The Yahoo source fills last_price / volume / previous_close
//   from the regular-market quote.
//
// Every numeric field is optional: an upstream API returning no
// value for a field must propagate as `null`, never as an error.
//
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Collection wall-clock time, ISO-8601
    pub timestamp: String,

    /// Ticker identifier, as configured
    pub symbol: String,

    /// Price of the most recent trade (or regular-market price)
    pub last_price: Option<f64>,

    /// Size of the most recent trade
    pub last_size: Option<f64>,

    /// Daily open
    pub open: Option<f64>,

    /// Daily high
    pub high: Option<f64>,

    /// Daily low
    pub low: Option<f64>,

    /// Daily close (the "current" price for change computation)
    pub close: Option<f64>,

    /// Daily traded volume
    pub volume: Option<f64>,

    /// Previous session's closing price
    pub previous_close: Option<f64>,

    /// Percentage change versus the previous close.
    ///
    /// Present only when both the current price and a non-zero
    /// previous close are known.
    pub change_percent: Option<f64>,
}

impl QuoteRecord {
    /// An empty record carrying only identity and collection time.
    pub fn bare(symbol: &str, timestamp: String) -> Self {
        Self {
            timestamp,
            symbol: symbol.to_string(),
            last_price: None,
            last_size: None,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
            previous_close: None,
            change_percent: None,
        }
    }
}

// ------------------------------------------------------------
// Historical aggregate bar
// ------------------------------------------------------------
//
// One OHLCV bar from the aggregates endpoint. Only produced by the
// Polygon source; fetched in bulk at collector startup.
//
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBar {
    /// Bar start, milliseconds since Unix epoch
    pub timestamp: i64,

    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,

    /// Volume-weighted average price, when the API provides it
    pub vwap: Option<f64>,

    /// Number of transactions in the bar, when the API provides it
    pub transactions: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> QuoteRecord {
        QuoteRecord {
            timestamp: "2026-08-07T14:00:00+00:00".to_string(),
            symbol: "XOM".to_string(),
            last_price: Some(113.52),
            last_size: Some(200.0),
            open: Some(112.0),
            high: Some(114.1),
            low: Some(111.8),
            close: Some(113.4),
            volume: Some(12_345_678.0),
            previous_close: Some(111.0),
            change_percent: Some(2.162162162162162),
        }
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("XOM".to_string(), sample_record());
        snapshot.insert(
            "CVX".to_string(),
            QuoteRecord::bare("CVX", "2026-08-07T14:00:00+00:00".to_string()),
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn absent_fields_serialize_as_null() {
        let record = QuoteRecord::bare("NG.COMM", "2026-08-07T14:00:00+00:00".to_string());
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["last_price"].is_null());
        assert!(value["change_percent"].is_null());
        assert_eq!(value["symbol"], "NG.COMM");
    }

    #[test]
    fn record_missing_required_field_fails_to_decode() {
        // No "timestamp" field: must be a decode error, not a default.
        let raw = r#"{"symbol": "XOM", "last_price": 10.0}"#;
        assert!(serde_json::from_str::<QuoteRecord>(raw).is_err());
    }
}
