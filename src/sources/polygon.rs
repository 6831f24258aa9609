use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::RelayError;
use crate::schema::{AggregateBar, QuoteRecord};
use crate::util;

use super::adapter::MarketSource;

/// Polygon.io REST base URL
const BASE_URL: &str = "https://api.polygon.io";

/// Maximum rows requested from the aggregates endpoint
const AGGS_LIMIT: &str = "50000";

// ------------------------------------------------------------
// PolygonSource
// ------------------------------------------------------------
//
// REST adapter for Polygon.io.
//
// One quote costs three requests:
// - last trade            GET /v2/last/trade/{ticker}
// - today's open/close    GET /v1/open-close/{ticker}/{date}
// - yesterday's open/close (same endpoint, previous date)
//
// The API key is passed as the `apiKey` query parameter on every
// request and never appears in logs.
//
pub struct PolygonSource {
    client: reqwest::Client,
    api_key: String,
}

impl PolygonSource {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Builds a source from the POLYGON_API_KEY environment variable.
    ///
    /// A missing key is a startup error; the collector binary exits
    /// with the error message.
    pub fn from_env() -> Result<Self, RelayError> {
        let api_key = std::env::var("POLYGON_API_KEY")
            .map_err(|_| RelayError::MissingCredential("POLYGON_API_KEY"))?;
        Ok(Self::new(api_key))
    }

    /// One authenticated GET, decoded as `T`.
    ///
    /// Any transport failure, non-success status or decode failure is
    /// an upstream error attributed to `symbol`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        symbol: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RelayError> {
        let url = format!("{}{}", BASE_URL, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| RelayError::upstream(symbol, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::upstream(symbol, format!("HTTP {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RelayError::upstream(symbol, e))
    }

    async fn last_trade(&self, symbol: &str) -> Result<Option<LastTrade>, RelayError> {
        let envelope: LastTradeEnvelope = self
            .get_json(symbol, &format!("/v2/last/trade/{}", symbol), &[])
            .await?;
        Ok(envelope.results)
    }

    async fn daily_open_close(
        &self,
        symbol: &str,
        date: &str,
    ) -> Result<DailyOpenClose, RelayError> {
        self.get_json(symbol, &format!("/v1/open-close/{}/{}", symbol, date), &[])
            .await
    }

    /// Historical OHLCV bars over a date range.
    ///
    /// Mirrors the aggregates endpoint:
    /// GET /v2/aggs/ticker/{t}/range/{multiplier}/{timespan}/{from}/{to}
    ///
    /// `timespan` is one of minute, hour, day, week, month, quarter,
    /// year. Dates are YYYY-MM-DD.
    pub async fn aggregates(
        &self,
        symbol: &str,
        multiplier: u32,
        timespan: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<AggregateBar>, RelayError> {
        let path = format!(
            "/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            symbol, multiplier, timespan, from, to
        );
        let envelope: AggsEnvelope = self
            .get_json(symbol, &path, &[("limit", AGGS_LIMIT)])
            .await?;

        Ok(envelope
            .results
            .unwrap_or_default()
            .into_iter()
            .map(AggregateBar::from)
            .collect())
    }
}

#[async_trait::async_trait]
impl MarketSource for PolygonSource {
    fn name(&self) -> &'static str {
        "polygon"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, RelayError> {
        let trade = self.last_trade(symbol).await?;
        let today = self.daily_open_close(symbol, &util::today_string()).await?;
        let previous = self
            .daily_open_close(symbol, &util::days_ago_string(1))
            .await?;

        Ok(assemble_record(symbol, util::now_iso(), trade, today, previous))
    }
}

/// Combines the three endpoint responses into one quote record.
///
/// Kept free of I/O so the mapping is testable without a network.
fn assemble_record(
    symbol: &str,
    timestamp: String,
    trade: Option<LastTrade>,
    today: DailyOpenClose,
    previous: DailyOpenClose,
) -> QuoteRecord {
    QuoteRecord {
        timestamp,
        symbol: symbol.to_string(),
        last_price: trade.as_ref().and_then(|t| t.price),
        last_size: trade.as_ref().and_then(|t| t.size),
        open: today.open,
        high: today.high,
        low: today.low,
        close: today.close,
        volume: today.volume,
        previous_close: previous.close,
        change_percent: util::change_percent(today.close, previous.close),
    }
}

// ------------------------------------------------------------
// Wire formats
// ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LastTradeEnvelope {
    results: Option<LastTrade>,
}

#[derive(Debug, Deserialize)]
struct LastTrade {
    /// Trade price
    #[serde(rename = "p")]
    price: Option<f64>,

    /// Trade size
    #[serde(rename = "s")]
    size: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct DailyOpenClose {
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AggsEnvelope {
    results: Option<Vec<AggsRow>>,
}

#[derive(Debug, Deserialize)]
struct AggsRow {
    #[serde(rename = "t")]
    timestamp: i64,
    #[serde(rename = "o")]
    open: f64,
    #[serde(rename = "h")]
    high: f64,
    #[serde(rename = "l")]
    low: f64,
    #[serde(rename = "c")]
    close: f64,
    #[serde(rename = "v")]
    volume: f64,
    #[serde(rename = "vw")]
    vwap: Option<f64>,
    #[serde(rename = "n")]
    transactions: Option<i64>,
}

impl From<AggsRow> for AggregateBar {
    fn from(row: AggsRow) -> Self {
        Self {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            vwap: row.vwap,
            transactions: row.transactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_assembly_computes_change_from_closes() {
        let today = DailyOpenClose {
            close: Some(100.0),
            ..Default::default()
        };
        let previous = DailyOpenClose {
            close: Some(90.0),
            ..Default::default()
        };
        let record = assemble_record("XOM", "ts".to_string(), None, today, previous);

        assert_eq!(record.symbol, "XOM");
        assert_eq!(record.last_price, None);
        let pct = record.change_percent.unwrap();
        assert!((pct - 11.11).abs() < 0.01);
    }

    #[test]
    fn record_assembly_with_zero_previous_close() {
        let today = DailyOpenClose {
            close: Some(100.0),
            ..Default::default()
        };
        let previous = DailyOpenClose {
            close: Some(0.0),
            ..Default::default()
        };
        let record = assemble_record("NG.COMM", "ts".to_string(), None, today, previous);
        assert_eq!(record.change_percent, None);
    }

    #[test]
    fn last_trade_envelope_decodes() {
        let raw = r#"{"status":"OK","results":{"p":113.52,"s":200,"t":1700000000000}}"#;
        let envelope: LastTradeEnvelope = serde_json::from_str(raw).unwrap();
        let trade = envelope.results.unwrap();
        assert_eq!(trade.price, Some(113.52));
        assert_eq!(trade.size, Some(200.0));
    }

    #[test]
    fn aggs_envelope_decodes_into_bars() {
        let raw = r#"{
            "ticker": "XOM",
            "results": [
                {"t": 1704067200000, "o": 100.0, "h": 102.5, "l": 99.1, "c": 101.7, "v": 1000000, "vw": 100.9, "n": 4521}
            ]
        }"#;
        let envelope: AggsEnvelope = serde_json::from_str(raw).unwrap();
        let bars: Vec<AggregateBar> = envelope
            .results
            .unwrap()
            .into_iter()
            .map(AggregateBar::from)
            .collect();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].timestamp, 1704067200000);
        assert_eq!(bars[0].vwap, Some(100.9));
        assert_eq!(bars[0].transactions, Some(4521));
    }

    #[test]
    fn missing_aggs_results_is_empty_not_error() {
        let raw = r#"{"ticker": "XOM", "queryCount": 0}"#;
        let envelope: AggsEnvelope = serde_json::from_str(raw).unwrap();
        assert!(envelope.results.is_none());
    }
}
