use crate::debounce::Debouncer;
use crate::error::PanelError;
use crate::{now_ms, PanelFilterEvent};
use analytics::{collapse_bursts, AggregatedEvent};
use bridge::{ActionDispatch, DispatchRequest, HealthRecorder, LedgerBridge, PrefsStore};
use configuration::{FeedConfig, UiConfig};
use core_types::{clamp_limit, normalize_symbol, AuditEvent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// The panel id this shell reports health under.
pub const CHANGES_PANEL_ID: &str = "changes";

/// The fixed storage key the persisted preferences live under.
pub const PREFS_STORAGE_KEY: &str = "glass.panels.changes.prefs";

/// The persisted slice of panel state: `{limit, rangeHours, filterSymbol}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PanelPrefs {
    limit: Option<u64>,
    range_hours: Option<u32>,
    filter_symbol: Option<String>,
}

/// The "changes" audit-log viewer shell.
///
/// Owns local UI state only (filters, query string, pending flag); all data
/// comes through the injected dispatcher, falling back to the degraded
/// read-only bridge when dispatch is unavailable or rejects. Fetch failures
/// become an error banner and a health report; they never propagate.
pub struct ChangesPanel {
    dispatcher: Arc<dyn ActionDispatch>,
    ledger: Arc<dyn LedgerBridge>,
    health: Arc<dyn HealthRecorder>,
    prefs: Arc<dyn PrefsStore>,
    config: FeedConfig,
    debouncer: Debouncer,

    limit: u64,
    range_hours: u32,
    filter_symbol: Option<String>,
    query: String,
    pending: bool,
    error: Option<String>,
    rows: Vec<AggregatedEvent>,
}

impl ChangesPanel {
    pub fn new(
        dispatcher: Arc<dyn ActionDispatch>,
        ledger: Arc<dyn LedgerBridge>,
        health: Arc<dyn HealthRecorder>,
        prefs: Arc<dyn PrefsStore>,
        config: FeedConfig,
        ui: &UiConfig,
    ) -> Self {
        let stored = load_prefs(prefs.as_ref());
        let limit = clamp_limit(stored.limit, config.default_limit, 1, config.max_limit);
        let range_hours = stored.range_hours.unwrap_or(config.default_range_hours);
        let filter_symbol = stored
            .filter_symbol
            .filter(|s| !s.trim().is_empty());
        Self {
            dispatcher,
            ledger,
            health,
            prefs,
            debouncer: Debouncer::new(ui.debounce_ms),
            config,
            limit,
            range_hours,
            filter_symbol,
            query: String::new(),
            pending: false,
            error: None,
            rows: Vec::new(),
        }
    }

    /// Fetches, filters and re-aggregates the feed.
    pub async fn refresh(&mut self) {
        let ticket = self.debouncer.ticket();
        self.pending = true;
        let fetched = self.fetch_events().await;
        // The spinner must clear even when a newer interaction superseded
        // this fetch and its result gets discarded.
        self.pending = false;
        if !self.debouncer.is_current(ticket) {
            tracing::debug!(panel = CHANGES_PANEL_ID, "Discarding stale response.");
            return;
        }
        match fetched.and_then(|events| self.transform(events)) {
            Ok(rows) => {
                self.health
                    .record_ledger_health(CHANGES_PANEL_ID, true, None);
                self.error = None;
                self.rows = rows;
            }
            Err(e) => {
                let message = e.to_string();
                self.health
                    .record_ledger_health(CHANGES_PANEL_ID, false, Some(&message));
                self.error = Some(message);
                self.rows.clear();
            }
        }
    }

    /// Updates the free-text filter and refreshes after the debounce delay,
    /// unless a newer interaction supersedes this one first.
    pub async fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_string();
        let ticket = self.debouncer.ticket();
        if self.debouncer.settle(ticket).await {
            self.refresh().await;
        } else {
            tracing::debug!(panel = CHANGES_PANEL_ID, "Debounced keystroke superseded.");
        }
    }

    pub async fn set_range_hours(&mut self, range_hours: u32) {
        self.range_hours = range_hours.max(1);
        self.save_prefs();
        self.refresh().await;
    }

    pub async fn set_limit(&mut self, limit: u64) {
        self.limit = clamp_limit(Some(limit), self.config.default_limit, 1, self.config.max_limit);
        self.save_prefs();
        self.refresh().await;
    }

    pub async fn set_filter_symbol(&mut self, symbol: Option<&str>) {
        self.filter_symbol = symbol
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self.save_prefs();
        self.refresh().await;
    }

    /// Applies an externally-driven filter event and refreshes once.
    pub async fn apply_filter_event(&mut self, event: &PanelFilterEvent) {
        if let Some(hours) = event.range_hours {
            self.range_hours = hours.max(1);
        }
        if let Some(limit) = event.limit {
            self.limit = clamp_limit(Some(limit), self.config.default_limit, 1, self.config.max_limit);
        }
        if let Some(symbol) = &event.symbol {
            self.filter_symbol = Some(symbol.clone()).filter(|s| !s.trim().is_empty());
        }
        self.save_prefs();
        self.refresh().await;
    }

    // --- Read-only state for the renderer ---

    pub fn rows(&self) -> &[AggregatedEvent] {
        &self.rows
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn range_hours(&self) -> u32 {
        self.range_hours
    }

    pub fn filter_symbol(&self) -> Option<&str> {
        self.filter_symbol.as_deref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    // --- Internals ---

    /// Dispatch first; on an unavailable dispatcher, a rejected action or a
    /// transport failure, fall through to the degraded list path.
    async fn fetch_events(&self) -> Result<Vec<AuditEvent>, PanelError> {
        if self.dispatcher.is_available() {
            let request = DispatchRequest::new("changes.list", json!({ "limit": self.limit }));
            match self.dispatcher.dispatch(request).await {
                Ok(outcome) if outcome.ok => {
                    return decode_entries(outcome.data.unwrap_or(Value::Null));
                }
                Ok(outcome) => {
                    tracing::warn!(
                        panel = CHANGES_PANEL_ID,
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "Dispatch rejected; using fallback list."
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        panel = CHANGES_PANEL_ID,
                        error = %e,
                        "Dispatch failed; using fallback list."
                    );
                }
            }
        }
        self.ledger
            .list_changes(self.limit)
            .await
            .map_err(PanelError::from)
    }

    fn transform(&self, events: Vec<AuditEvent>) -> Result<Vec<AggregatedEvent>, PanelError> {
        let filtered = self.filter_events(events, now_ms());
        collapse_bursts(&filtered, self.config.window_ms).map_err(PanelError::from)
    }

    /// Client-side filtering: range window, symbol equality, free-text query.
    /// Events without a timestamp pass the range cut since their age cannot
    /// be judged.
    fn filter_events(&self, events: Vec<AuditEvent>, now: i64) -> Vec<AuditEvent> {
        let cutoff = now - i64::from(self.range_hours) * 3_600_000;
        let wanted_symbol = self
            .filter_symbol
            .as_deref()
            .map(normalize_symbol)
            .filter(|s| !s.is_empty());
        let needle = self.query.to_lowercase();

        events
            .into_iter()
            .filter(|event| {
                event.created_at_ms.map_or(true, |ts| ts >= cutoff)
            })
            .filter(|event| match &wanted_symbol {
                Some(wanted) => event
                    .symbol
                    .as_deref()
                    .map(normalize_symbol)
                    .is_some_and(|s| s == *wanted),
                None => true,
            })
            .filter(|event| {
                if needle.is_empty() {
                    return true;
                }
                event.event_type.to_lowercase().contains(&needle)
                    || event
                        .reason_text()
                        .is_some_and(|r| r.to_lowercase().contains(&needle))
                    || event
                        .symbol
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .collect()
    }

    fn save_prefs(&self) {
        let prefs = PanelPrefs {
            limit: Some(self.limit),
            range_hours: Some(self.range_hours),
            filter_symbol: self.filter_symbol.clone(),
        };
        match serde_json::to_string(&prefs) {
            Ok(blob) => self.prefs.save(PREFS_STORAGE_KEY, &blob),
            Err(e) => tracing::debug!(error = %e, "Failed to encode prefs; skipping save."),
        }
    }
}

fn load_prefs(store: &dyn PrefsStore) -> PanelPrefs {
    store
        .load(PREFS_STORAGE_KEY)
        .and_then(|blob| serde_json::from_str(&blob).ok())
        .unwrap_or_default()
}

fn decode_entries(data: Value) -> Result<Vec<AuditEvent>, PanelError> {
    let entries = match data {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map
            .remove("entries")
            .ok_or_else(|| PanelError::MalformedPayload("missing entries".to_string()))?,
        other => {
            return Err(PanelError::MalformedPayload(format!(
                "expected entries, got {other}"
            )))
        }
    };
    serde_json::from_value(entries).map_err(|e| PanelError::MalformedPayload(e.to_string()))
}
