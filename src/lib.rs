// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:    Configuration structs (broker, collector, delivery)
// - schema:    Strongly typed market record definitions
// - error:     Typed error taxonomy for the relay pipeline
// - util:      Shared helper utilities (time, formatting, shutdown)
// - sources:   Market-data source adapters and HTTP clients
// - broker:    Broker abstraction (Redis Streams + in-memory)
// - collector: Poll-collect-publish runtime
// - consumer:  Topic subscription and console rendering
// - metrics:   Global runtime counters
//
pub mod config;
pub mod schema;
pub mod error;
pub mod util;
pub mod sources;
pub mod broker;
pub mod collector;
pub mod consumer;
pub mod metrics;

pub use config::{BrokerConfig, CollectorConfig, DeliveryGuarantee, OffsetReset};
pub use error::RelayError;
pub use schema::{QuoteRecord, Snapshot};
