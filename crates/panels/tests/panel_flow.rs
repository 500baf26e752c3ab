use async_trait::async_trait;
use bridge::{
    ActionDispatch, BridgeError, DispatchOutcome, DispatchRequest, HealthRecorder, LedgerBridge,
    MemoryStore, NullDispatcher, PrefsStore,
};
use configuration::{FeedConfig, FreshnessConfig, UiConfig};
use core_types::{AuditEvent, EventLevel, Quote};
use panels::{ChangesPanel, PanelFilterEvent, SnapshotPanel};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays a fixed script of dispatch outcomes and records every request.
struct ScriptedDispatcher {
    available: bool,
    outcomes: Mutex<VecDeque<DispatchOutcome>>,
    requests: Mutex<Vec<DispatchRequest>>,
}

impl ScriptedDispatcher {
    fn new(outcomes: Vec<DispatchOutcome>) -> Self {
        Self {
            available: true,
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn ok(data: serde_json::Value) -> DispatchOutcome {
        DispatchOutcome {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn rejected(message: &str) -> DispatchOutcome {
        DispatchOutcome {
            ok: false,
            data: None,
            error: Some(message.to_string()),
        }
    }

    fn seen_actions(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.action_id.clone())
            .collect()
    }
}

#[async_trait]
impl ActionDispatch for ScriptedDispatcher {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, BridgeError> {
        self.requests.lock().unwrap().push(request);
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptedDispatcher::rejected("script exhausted")))
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

struct ScriptedLedger {
    entries: Vec<AuditEvent>,
    symbols: Vec<String>,
    quote: Option<Quote>,
    fail: bool,
}

impl ScriptedLedger {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            symbols: Vec::new(),
            quote: None,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::empty()
        }
    }
}

#[async_trait]
impl LedgerBridge for ScriptedLedger {
    async fn list_changes(&self, _limit: u64) -> Result<Vec<AuditEvent>, BridgeError> {
        if self.fail {
            return Err(BridgeError::Api("ledger down".to_string()));
        }
        Ok(self.entries.clone())
    }

    async fn list_symbols(&self, query: &str, _limit: u64) -> Result<Vec<String>, BridgeError> {
        if self.fail {
            return Err(BridgeError::Api("ledger down".to_string()));
        }
        let needle = query.to_uppercase();
        Ok(self
            .symbols
            .iter()
            .filter(|s| s.to_uppercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, BridgeError> {
        match &self.quote {
            Some(quote) => Ok(quote.clone()),
            None => Err(BridgeError::Api(format!("no tick data for {symbol}"))),
        }
    }
}

#[derive(Default)]
struct RecordingHealth {
    reports: Mutex<Vec<(String, bool, Option<String>)>>,
}

impl HealthRecorder for RecordingHealth {
    fn record_ledger_health(&self, panel_id: &str, ok: bool, message: Option<&str>) {
        self.reports.lock().unwrap().push((
            panel_id.to_string(),
            ok,
            message.map(str::to_string),
        ));
    }
}

fn fast_ui() -> UiConfig {
    UiConfig {
        debounce_ms: 0,
        ..UiConfig::default()
    }
}

fn recent_event(event_type: &str, symbol: Option<&str>, reason: &str, age_ms: i64) -> AuditEvent {
    let mut payload = serde_json::Map::new();
    payload.insert("reason".to_string(), json!(reason));
    AuditEvent {
        id: None,
        event_type: event_type.to_string(),
        level: EventLevel::Info,
        symbol: symbol.map(str::to_string),
        payload,
        created_at_ms: Some(panels::now_ms() - age_ms),
        count: None,
    }
}

fn changes_panel(
    dispatcher: Arc<dyn ActionDispatch>,
    ledger: Arc<dyn LedgerBridge>,
    health: Arc<RecordingHealth>,
    prefs: Arc<dyn PrefsStore>,
) -> ChangesPanel {
    ChangesPanel::new(
        dispatcher,
        ledger,
        health,
        prefs,
        FeedConfig::default(),
        &fast_ui(),
    )
}

#[tokio::test]
async fn refresh_renders_dispatched_entries() {
    let entry = recent_event("order.rejected", Some("EURUSD"), "margin call", 1_000);
    let dispatcher = Arc::new(ScriptedDispatcher::new(vec![ScriptedDispatcher::ok(
        json!({ "entries": [entry] }),
    )]));
    let health = Arc::new(RecordingHealth::default());
    let mut panel = changes_panel(
        dispatcher.clone(),
        Arc::new(ScriptedLedger::empty()),
        health.clone(),
        Arc::new(MemoryStore::default()),
    );

    panel.refresh().await;

    assert_eq!(panel.rows().len(), 1);
    assert_eq!(panel.rows()[0].sample.event_type, "order.rejected");
    assert!(panel.error().is_none());
    assert!(!panel.pending());
    assert_eq!(dispatcher.seen_actions(), vec!["changes.list".to_string()]);
    assert_eq!(
        *health.reports.lock().unwrap(),
        vec![("changes".to_string(), true, None)]
    );
}

#[tokio::test]
async fn rejected_dispatch_falls_back_to_ledger_list() {
    let dispatcher = Arc::new(ScriptedDispatcher::new(vec![ScriptedDispatcher::rejected(
        "action unknown",
    )]));
    let ledger = ScriptedLedger {
        entries: vec![
            recent_event("sync", Some("EURUSD"), "ok", 1_000),
            recent_event("sync", Some("EURUSD"), "ok", 2_000),
        ],
        ..ScriptedLedger::empty()
    };
    let mut panel = changes_panel(
        dispatcher,
        Arc::new(ledger),
        Arc::new(RecordingHealth::default()),
        Arc::new(MemoryStore::default()),
    );

    panel.refresh().await;

    // Both fallback events collapse into one burst row.
    assert_eq!(panel.rows().len(), 1);
    assert_eq!(panel.rows()[0].count, 2);
    assert_eq!(panel.rows()[0].suppressed_count, 1);
    assert!(panel.error().is_none());
}

#[tokio::test]
async fn null_dispatcher_skips_straight_to_fallback() {
    let ledger = ScriptedLedger {
        entries: vec![recent_event("sync", None, "ok", 1_000)],
        ..ScriptedLedger::empty()
    };
    let mut panel = changes_panel(
        Arc::new(NullDispatcher),
        Arc::new(ledger),
        Arc::new(RecordingHealth::default()),
        Arc::new(MemoryStore::default()),
    );

    panel.refresh().await;

    assert_eq!(panel.rows().len(), 1);
    assert!(panel.error().is_none());
}

#[tokio::test]
async fn fetch_failure_becomes_error_banner_and_health_report() {
    let health = Arc::new(RecordingHealth::default());
    let mut panel = changes_panel(
        Arc::new(NullDispatcher),
        Arc::new(ScriptedLedger::failing()),
        health.clone(),
        Arc::new(MemoryStore::default()),
    );

    panel.refresh().await;

    assert!(panel.rows().is_empty());
    let banner = panel.error().expect("error banner");
    assert!(banner.contains("ledger down"));
    let reports = health.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, "changes");
    assert!(!reports[0].1);
}

#[tokio::test]
async fn symbol_and_query_filters_trim_the_feed() {
    let entries = vec![
        recent_event("order.filled", Some("EURUSD"), "filled", 1_000),
        recent_event("order.filled", Some("GBPUSD"), "filled", 1_000),
        recent_event("sync.done", Some("EURUSD"), "catalog refresh", 1_000),
    ];
    let ledger = ScriptedLedger {
        entries,
        ..ScriptedLedger::empty()
    };
    let mut panel = changes_panel(
        Arc::new(NullDispatcher),
        Arc::new(ledger),
        Arc::new(RecordingHealth::default()),
        Arc::new(MemoryStore::default()),
    );

    panel.set_filter_symbol(Some("eur/usd")).await;
    assert_eq!(panel.rows().len(), 2);

    panel.set_query("order").await;
    assert_eq!(panel.rows().len(), 1);
    assert_eq!(panel.rows()[0].sample.event_type, "order.filled");
}

#[tokio::test]
async fn range_window_drops_old_events_but_keeps_untimed_ones() {
    let mut untimed = recent_event("legacy", None, "no clock", 0);
    untimed.created_at_ms = None;
    let ledger = ScriptedLedger {
        entries: vec![
            recent_event("fresh", None, "now", 1_000),
            recent_event("ancient", None, "old", 48 * 3_600_000),
            untimed,
        ],
        ..ScriptedLedger::empty()
    };
    let mut panel = changes_panel(
        Arc::new(NullDispatcher),
        Arc::new(ledger),
        Arc::new(RecordingHealth::default()),
        Arc::new(MemoryStore::default()),
    );

    // Default range is 24 hours; the two-day-old event is cut, the
    // timestamp-less one passes.
    panel.refresh().await;
    let types: Vec<&str> = panel
        .rows()
        .iter()
        .map(|r| r.sample.event_type.as_str())
        .collect();
    assert!(types.contains(&"fresh"));
    assert!(types.contains(&"legacy"));
    assert!(!types.contains(&"ancient"));
}

#[tokio::test]
async fn preferences_round_trip_through_the_store() {
    let prefs: Arc<dyn PrefsStore> = Arc::new(MemoryStore::default());
    prefs.save(
        "glass.panels.changes.prefs",
        r#"{"limit":300,"rangeHours":6,"filterSymbol":"EURUSD"}"#,
    );

    let mut panel = changes_panel(
        Arc::new(NullDispatcher),
        Arc::new(ScriptedLedger::empty()),
        Arc::new(RecordingHealth::default()),
        prefs.clone(),
    );
    assert_eq!(panel.limit(), 300);
    assert_eq!(panel.range_hours(), 6);
    assert_eq!(panel.filter_symbol(), Some("EURUSD"));

    panel.set_limit(500).await;
    let blob = prefs.load("glass.panels.changes.prefs").expect("saved blob");
    assert!(blob.contains("\"limit\":500"));
    assert!(blob.contains("\"rangeHours\":6"));
}

#[tokio::test]
async fn corrupt_preferences_fall_back_to_defaults() {
    let prefs: Arc<dyn PrefsStore> = Arc::new(MemoryStore::default());
    prefs.save("glass.panels.changes.prefs", "{not json");

    let panel = changes_panel(
        Arc::new(NullDispatcher),
        Arc::new(ScriptedLedger::empty()),
        Arc::new(RecordingHealth::default()),
        prefs,
    );
    assert_eq!(panel.limit(), FeedConfig::default().default_limit);
    assert_eq!(panel.range_hours(), FeedConfig::default().default_range_hours);
}

#[tokio::test]
async fn filter_event_drives_panel_state() {
    let mut panel = changes_panel(
        Arc::new(NullDispatcher),
        Arc::new(ScriptedLedger::empty()),
        Arc::new(RecordingHealth::default()),
        Arc::new(MemoryStore::default()),
    );

    panel
        .apply_filter_event(&PanelFilterEvent {
            range_hours: Some(6),
            limit: Some(50),
            symbol: Some("GBPUSD".to_string()),
        })
        .await;

    assert_eq!(panel.range_hours(), 6);
    assert_eq!(panel.limit(), 50);
    assert_eq!(panel.filter_symbol(), Some("GBPUSD"));
}

fn snapshot_panel(
    dispatcher: Arc<dyn ActionDispatch>,
    ledger: Arc<dyn LedgerBridge>,
    health: Arc<RecordingHealth>,
) -> SnapshotPanel {
    SnapshotPanel::new(
        dispatcher,
        ledger,
        health,
        &FreshnessConfig::default(),
        &fast_ui(),
        "EURUSD",
        vec!["1h".to_string(), "4h".to_string(), "1d".to_string()],
    )
}

#[tokio::test]
async fn snapshot_refresh_classifies_every_requested_timeframe() {
    let now = panels::now_ms();
    let status = json!({
        "symbol": "EURUSD",
        "frames": {
            "1h": { "timeframe": "1h", "barsCount": 500, "lastUpdatedAtMs": now - 5 * 60_000 },
            "4h": { "timeframe": "4h", "barsCount": 12, "shortHistory": true }
        },
        "missing": ["1d"],
        "minBars": 50
    });
    let dispatcher = Arc::new(ScriptedDispatcher::new(vec![ScriptedDispatcher::ok(
        json!({ "status": status }),
    )]));
    let mut panel = snapshot_panel(
        dispatcher.clone(),
        Arc::new(ScriptedLedger::empty()),
        Arc::new(RecordingHealth::default()),
    );

    panel.refresh().await;

    assert!(panel.error().is_none());
    let states: Vec<(&str, &str)> = panel
        .reports()
        .iter()
        .map(|r| (r.timeframe.as_str(), r.state.as_str()))
        .collect();
    assert_eq!(
        states,
        vec![("1h", "fresh"), ("4h", "short"), ("1d", "missing")]
    );
    // Quote failure is tolerated; the status still renders.
    assert!(panel.quote().is_none());
    assert_eq!(dispatcher.seen_actions(), vec!["snapshot.status".to_string()]);
}

#[tokio::test]
async fn snapshot_without_bridge_shows_error_banner() {
    let health = Arc::new(RecordingHealth::default());
    let mut panel = snapshot_panel(
        Arc::new(NullDispatcher),
        Arc::new(ScriptedLedger::empty()),
        health.clone(),
    );

    panel.refresh().await;

    assert!(panel.reports().is_empty());
    assert!(panel.error().is_some());
    let reports = health.reports.lock().unwrap();
    assert_eq!(reports[0].0, "snapshot");
    assert!(!reports[0].1);
}

#[tokio::test]
async fn symbol_search_fills_suggestions() {
    let ledger = ScriptedLedger {
        symbols: vec![
            "EURUSD".to_string(),
            "EURGBP".to_string(),
            "USDJPY".to_string(),
        ],
        ..ScriptedLedger::empty()
    };
    let mut panel = snapshot_panel(
        Arc::new(ScriptedDispatcher::new(vec![])),
        Arc::new(ledger),
        Arc::new(RecordingHealth::default()),
    );

    panel.search_symbols("eur").await;
    assert_eq!(panel.suggestions(), ["EURUSD", "EURGBP"]);
}

#[tokio::test]
async fn filter_event_switches_snapshot_symbol() {
    let status = json!({ "symbol": "GBPUSD", "frames": {}, "missing": [], "minBars": 50 });
    let dispatcher = Arc::new(ScriptedDispatcher::new(vec![ScriptedDispatcher::ok(status)]));
    let mut panel = snapshot_panel(
        dispatcher,
        Arc::new(ScriptedLedger::empty()),
        Arc::new(RecordingHealth::default()),
    );

    panel
        .apply_filter_event(&PanelFilterEvent {
            symbol: Some("GBPUSD".to_string()),
            ..PanelFilterEvent::default()
        })
        .await;

    assert_eq!(panel.symbol(), "GBPUSD");
    // Empty frame map classifies everything missing.
    assert!(panel
        .reports()
        .iter()
        .all(|r| r.state.as_str() == "missing"));
}
