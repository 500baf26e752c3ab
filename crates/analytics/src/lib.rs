pub mod error;
pub mod feed;
pub mod freshness;

// Re-export the core types to provide a clean public API.
pub use error::AnalyticsError;
pub use feed::{collapse_bursts, AggregatedEvent, DEFAULT_WINDOW_MS};
pub use freshness::{classify, FreshnessPolicy, FreshnessReport, FreshnessState};
