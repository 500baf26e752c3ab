use serde::{Deserialize, Serialize};

pub mod changes;
pub mod debounce;
pub mod error;
pub mod snapshot;

// Re-export the panel shells to provide a clean public API.
pub use changes::ChangesPanel;
pub use debounce::Debouncer;
pub use error::PanelError;
pub use snapshot::SnapshotPanel;

/// An externally-driven filter change, delivered by the host UI as a custom
/// event. Absent fields leave the corresponding panel state untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelFilterEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
