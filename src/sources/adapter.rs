use crate::error::RelayError;
use crate::schema::QuoteRecord;

/// MarketSource is the abstraction layer between:
/// - The generic collector runtime
/// - Source-specific REST APIs
///
/// Each source implementation must:
/// - Query its upstream API for one symbol at a time
/// - Normalize the response into a `QuoteRecord`
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - Source instances are shared behind `Arc`
///
#[async_trait::async_trait]
pub trait MarketSource: Send + Sync {
    /// Canonical source name, used for logging.
    fn name(&self) -> &'static str;

    /// Fetches the current quote for one symbol.
    ///
    /// CONTRACT:
    /// - A request or decode failure returns `RelayError::Upstream`;
    ///   the collector omits the symbol and continues the cycle.
    /// - A successful response with absent numeric fields produces a
    ///   record with those fields set to None. Partial data is not
    ///   an error.
    /// - `change_percent` is filled only when both the current price
    ///   and a non-zero previous close are known.
    /// - This function must never panic.
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, RelayError>;
}
