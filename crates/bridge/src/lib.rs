use async_trait::async_trait;
use core_types::{AuditEvent, Quote};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub mod error;
pub mod http;
pub mod null;
pub mod prefs;

// --- Public API ---
pub use error::BridgeError;
pub use http::LedgerClient;
pub use null::{LogHealthRecorder, NullDispatcher, NullHealthRecorder};
pub use prefs::{JsonFileStore, MemoryStore};

/// One action forwarded to the external ledger/trading subsystem.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub request_id: Uuid,
    pub action_id: String,
    pub payload: Value,
}

impl DispatchRequest {
    pub fn new(action_id: &str, payload: Value) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            action_id: action_id.to_string(),
            payload,
        }
    }
}

/// The bridge's answer to a dispatched action. A rejected action is an
/// `ok = false` outcome, not an error; errors are reserved for transport
/// failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The generic, abstract interface for the host's action dispatcher.
/// This trait is the only control surface the panels have into the external
/// ledger/trading subsystem; implementations (live HTTP bridge or the null
/// object) can be swapped out freely.
#[async_trait]
pub trait ActionDispatch: Send + Sync {
    /// Forwards one action to the host and returns its outcome.
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, BridgeError>;

    /// Whether the dispatcher has a live host behind it. Panels use this to
    /// skip straight to their degraded path.
    fn is_available(&self) -> bool;
}

/// The degraded read-only surface the panels fall back to when action
/// dispatch is unavailable or rejects a request.
#[async_trait]
pub trait LedgerBridge: Send + Sync {
    /// Fetches the most recent audit entries, newest last.
    async fn list_changes(&self, limit: u64) -> Result<Vec<AuditEvent>, BridgeError>;

    /// Searches the broker's symbol universe.
    async fn list_symbols(&self, query: &str, limit: u64) -> Result<Vec<String>, BridgeError>;

    /// Fetches the current quote for one symbol.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, BridgeError>;
}

/// Sink for per-panel fetch health. Recording must never fail; implementations
/// swallow their own errors.
pub trait HealthRecorder: Send + Sync {
    fn record_ledger_health(&self, panel_id: &str, ok: bool, message: Option<&str>);
}

/// Best-effort persisted panel preferences, keyed by an opaque storage key.
/// Callers ignore failures on both paths; a broken store degrades to
/// defaults, never to an error.
pub trait PrefsStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str);
}
