pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{EventLevel, Timeframe};
pub use error::CoreError;
pub use structs::{
    clamp_limit, normalize_symbol, AuditEvent, Quote, SnapshotStatus, TimeframeFrame,
};
