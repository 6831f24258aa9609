use serde::Deserialize;

use crate::error::RelayError;
use crate::schema::QuoteRecord;
use crate::util;

use super::adapter::MarketSource;

/// Yahoo Finance quote base URL
const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// The quote endpoint rejects clients without a browser user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64)";

// ------------------------------------------------------------
// YahooSource
// ------------------------------------------------------------
//
// REST adapter for the Yahoo Finance regular-market quote:
//
//     GET /v7/finance/quote?symbols={symbol}
//
// Keyless; one request per symbol per cycle. Fields that the
// endpoint omits (futures without volume, halted tickers) stay None.
//
pub struct YahooSource {
    client: reqwest::Client,
}

impl YahooSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for YahooSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MarketSource for YahooSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, RelayError> {
        let url = format!("{}/v7/finance/quote", BASE_URL);
        let response = self
            .client
            .get(&url)
            .query(&[("symbols", symbol)])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| RelayError::upstream(symbol, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::upstream(symbol, format!("HTTP {}", status)));
        }

        let envelope: QuoteEnvelope = response
            .json()
            .await
            .map_err(|e| RelayError::upstream(symbol, e))?;

        let quote = envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| RelayError::upstream(symbol, "empty quote response"))?;

        Ok(record_from_quote(symbol, util::now_iso(), quote))
    }
}

/// Maps one regular-market quote onto the unified record shape.
fn record_from_quote(symbol: &str, timestamp: String, quote: YahooQuote) -> QuoteRecord {
    let mut record = QuoteRecord::bare(symbol, timestamp);
    record.last_price = quote.regular_market_price;
    record.volume = quote.regular_market_volume;
    record.previous_close = quote.regular_market_previous_close;
    record.change_percent = util::change_percent(
        quote.regular_market_price,
        quote.regular_market_previous_close,
    );
    record
}

// ------------------------------------------------------------
// Wire formats
// ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,

    #[serde(rename = "regularMarketPreviousClose")]
    regular_market_previous_close: Option<f64>,

    #[serde(rename = "regularMarketVolume")]
    regular_market_volume: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_maps_to_record() {
        let quote = YahooQuote {
            regular_market_price: Some(95.0),
            regular_market_previous_close: Some(100.0),
            regular_market_volume: Some(4_500_000.0),
        };
        let record = record_from_quote("CVX", "ts".to_string(), quote);

        assert_eq!(record.last_price, Some(95.0));
        assert_eq!(record.previous_close, Some(100.0));
        assert_eq!(record.volume, Some(4_500_000.0));
        assert_eq!(record.change_percent, Some(-5.0));
        assert_eq!(record.open, None);
    }

    #[test]
    fn missing_previous_close_leaves_change_unset() {
        let quote = YahooQuote {
            regular_market_price: Some(72.4),
            regular_market_previous_close: None,
            regular_market_volume: None,
        };
        let record = record_from_quote("CL=F", "ts".to_string(), quote);
        assert_eq!(record.change_percent, None);
        assert_eq!(record.volume, None);
    }

    #[test]
    fn envelope_decodes_real_shape() {
        let raw = r#"{
            "quoteResponse": {
                "result": [
                    {"symbol": "XOM", "regularMarketPrice": 113.52,
                     "regularMarketPreviousClose": 111.0,
                     "regularMarketVolume": 12345678}
                ],
                "error": null
            }
        }"#;
        let envelope: QuoteEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.quote_response.result.len(), 1);
    }

    #[test]
    fn empty_result_array_decodes() {
        let raw = r#"{"quoteResponse": {"result": [], "error": null}}"#;
        let envelope: QuoteEnvelope = serde_json::from_str(raw).unwrap();
        assert!(envelope.quote_response.result.is_empty());
    }
}
