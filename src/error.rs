use thiserror::Error;

/// Error taxonomy for the relay pipeline.
///
/// The variants map directly onto the recovery policy applied by the
/// runtime loops:
///
/// - `MissingCredential`: fatal at startup, the process exits with a message
/// - `Upstream`:          recovered per symbol, the symbol is omitted
/// - `Broker`:            logged, the cycle / message is skipped
/// - `Malformed`:         logged, the message is skipped
///
/// There is no retry, backoff or circuit-breaking layer on top of this.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required environment variable is not set.
    #[error("missing credential: set the {0} environment variable")]
    MissingCredential(&'static str),

    /// An upstream market-data request failed for one symbol.
    #[error("upstream request for {symbol} failed: {reason}")]
    Upstream { symbol: String, reason: String },

    /// A broker publish, subscribe or read operation failed.
    #[error("broker error: {0}")]
    Broker(String),

    /// A message payload could not be decoded into the expected schema.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl RelayError {
    /// Shorthand for building an `Upstream` error from any displayable cause.
    pub fn upstream(symbol: &str, reason: impl std::fmt::Display) -> Self {
        Self::Upstream {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<redis::RedisError> for RelayError {
    fn from(e: redis::RedisError) -> Self {
        Self::Broker(e.to_string())
    }
}
