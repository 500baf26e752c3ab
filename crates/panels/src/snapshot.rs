use crate::debounce::Debouncer;
use crate::error::PanelError;
use crate::{now_ms, PanelFilterEvent};
use analytics::{classify, FreshnessPolicy, FreshnessReport};
use bridge::{ActionDispatch, DispatchRequest, HealthRecorder, LedgerBridge};
use configuration::{FreshnessConfig, UiConfig};
use core_types::{Quote, SnapshotStatus};
use serde_json::{json, Value};
use std::sync::Arc;

/// The panel id this shell reports health under.
pub const SNAPSHOT_PANEL_ID: &str = "snapshot";

/// How many symbol suggestions one search round-trip asks for.
const SUGGESTION_LIMIT: u64 = 50;

/// The market-data snapshot selector/status shell.
///
/// Shows per-timeframe freshness for one symbol plus its current quote, and
/// drives an interactive symbol search box. The status fetch goes through
/// the dispatcher only; there is no degraded path for it, so an unavailable
/// bridge renders as an error banner. The quote is decorative: its failure
/// never fails the refresh.
pub struct SnapshotPanel {
    dispatcher: Arc<dyn ActionDispatch>,
    ledger: Arc<dyn LedgerBridge>,
    health: Arc<dyn HealthRecorder>,
    policy: FreshnessPolicy,
    debouncer: Debouncer,

    symbol: String,
    timeframes: Vec<String>,
    pending: bool,
    error: Option<String>,
    reports: Vec<FreshnessReport>,
    quote: Option<Quote>,
    suggestions: Vec<String>,
}

impl SnapshotPanel {
    pub fn new(
        dispatcher: Arc<dyn ActionDispatch>,
        ledger: Arc<dyn LedgerBridge>,
        health: Arc<dyn HealthRecorder>,
        freshness: &FreshnessConfig,
        ui: &UiConfig,
        symbol: &str,
        timeframes: Vec<String>,
    ) -> Self {
        let mut policy = FreshnessPolicy::default()
            .with_default_target(freshness.default_target_age_ms)
            .with_min_bars(freshness.min_bars);
        for (label, target_ms) in &freshness.target_ages_ms {
            policy = policy.with_target(label, *target_ms);
        }
        Self {
            dispatcher,
            ledger,
            health,
            policy,
            debouncer: Debouncer::new(ui.debounce_ms),
            symbol: symbol.trim().to_string(),
            timeframes,
            pending: false,
            error: None,
            reports: Vec::new(),
            quote: None,
            suggestions: Vec::new(),
        }
    }

    /// Fetches the snapshot status and re-classifies every timeframe.
    pub async fn refresh(&mut self) {
        let ticket = self.debouncer.ticket();
        self.pending = true;
        let fetched = self.fetch_status().await;
        let quote = match &fetched {
            // Decorative; ignore its failure entirely.
            Ok(_) => self.ledger.get_quote(&self.symbol).await.ok(),
            Err(_) => None,
        };
        // The spinner must clear even when a newer interaction superseded
        // this fetch and its result gets discarded.
        self.pending = false;
        if !self.debouncer.is_current(ticket) {
            tracing::debug!(panel = SNAPSHOT_PANEL_ID, "Discarding stale response.");
            return;
        }
        match fetched {
            Ok(status) => {
                self.health
                    .record_ledger_health(SNAPSHOT_PANEL_ID, true, None);
                self.error = None;
                self.quote = quote;
                self.reports = classify(&status, &self.timeframes, now_ms(), &self.policy);
            }
            Err(e) => {
                let message = e.to_string();
                self.health
                    .record_ledger_health(SNAPSHOT_PANEL_ID, false, Some(&message));
                self.error = Some(message);
                self.quote = None;
                self.reports.clear();
            }
        }
    }

    /// Debounced symbol search for the selector box.
    pub async fn search_symbols(&mut self, query: &str) {
        let query = query.trim().to_string();
        let ticket = self.debouncer.ticket();
        if !self.debouncer.settle(ticket).await {
            tracing::debug!(panel = SNAPSHOT_PANEL_ID, "Debounced keystroke superseded.");
            return;
        }
        let result = self.ledger.list_symbols(&query, SUGGESTION_LIMIT).await;
        if !self.debouncer.is_current(ticket) {
            return;
        }
        match result {
            Ok(symbols) => {
                self.suggestions = symbols;
            }
            Err(e) => {
                self.health.record_ledger_health(
                    SNAPSHOT_PANEL_ID,
                    false,
                    Some(&e.to_string()),
                );
                self.suggestions.clear();
            }
        }
    }

    pub async fn set_symbol(&mut self, symbol: &str) {
        self.symbol = symbol.trim().to_string();
        self.suggestions.clear();
        self.refresh().await;
    }

    /// Applies an externally-driven filter event; only the symbol field is
    /// meaningful for this panel.
    pub async fn apply_filter_event(&mut self, event: &PanelFilterEvent) {
        if let Some(symbol) = event.symbol.as_deref() {
            self.set_symbol(symbol).await;
        }
    }

    // --- Read-only state for the renderer ---

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframes(&self) -> &[String] {
        &self.timeframes
    }

    pub fn reports(&self) -> &[FreshnessReport] {
        &self.reports
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    // --- Internals ---

    async fn fetch_status(&self) -> Result<SnapshotStatus, PanelError> {
        if !self.dispatcher.is_available() {
            return Err(PanelError::Bridge(bridge::BridgeError::Unavailable));
        }
        let request = DispatchRequest::new(
            "snapshot.status",
            json!({ "symbol": self.symbol, "timeframes": self.timeframes }),
        );
        let outcome = self.dispatcher.dispatch(request).await?;
        if !outcome.ok {
            return Err(PanelError::Bridge(bridge::BridgeError::Api(
                outcome.error.unwrap_or_else(|| "snapshot unavailable".to_string()),
            )));
        }
        decode_status(outcome.data.unwrap_or(Value::Null))
    }
}

fn decode_status(data: Value) -> Result<SnapshotStatus, PanelError> {
    let status = match data {
        Value::Object(mut map) if map.contains_key("status") => map
            .remove("status")
            .unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(status).map_err(|e| PanelError::MalformedPayload(e.to_string()))
}
