//! Market-data source adapters.
//!
//! Each upstream API gets one adapter module. All source-specific
//! logic (endpoints, response shapes, authentication) must live in
//! the adapter; the rest of the crate interacts exclusively through
//! the `MarketSource` trait.

pub mod adapter;
pub mod polygon;
pub mod yahoo;

pub use adapter::MarketSource;
pub use polygon::PolygonSource;
pub use yahoo::YahooSource;
