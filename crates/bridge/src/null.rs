use crate::error::BridgeError;
use crate::{ActionDispatch, DispatchOutcome, DispatchRequest, HealthRecorder};
use async_trait::async_trait;

/// The null-object dispatcher used when no host bridge is attached
/// (offline/degraded mode). Every action comes back rejected; nothing ever
/// errors, so the panels render their empty state instead of crashing.
#[derive(Debug, Clone, Default)]
pub struct NullDispatcher;

#[async_trait]
impl ActionDispatch for NullDispatcher {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, BridgeError> {
        tracing::debug!(action = %request.action_id, "No bridge attached; rejecting dispatch.");
        Ok(DispatchOutcome {
            ok: false,
            data: None,
            error: Some("bridge unavailable".to_string()),
        })
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Records panel health through the tracing pipeline.
#[derive(Debug, Clone, Default)]
pub struct LogHealthRecorder;

impl HealthRecorder for LogHealthRecorder {
    fn record_ledger_health(&self, panel_id: &str, ok: bool, message: Option<&str>) {
        if ok {
            tracing::debug!(panel = panel_id, "Ledger fetch healthy.");
        } else {
            tracing::warn!(
                panel = panel_id,
                message = message.unwrap_or("unknown"),
                "Ledger fetch failed."
            );
        }
    }
}

/// Drops health reports entirely.
#[derive(Debug, Clone, Default)]
pub struct NullHealthRecorder;

impl HealthRecorder for NullHealthRecorder {
    fn record_ledger_health(&self, _panel_id: &str, _ok: bool, _message: Option<&str>) {}
}
