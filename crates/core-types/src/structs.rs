use crate::enums::EventLevel;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One immutable entry from the external audit ledger.
///
/// Events arrive over the bridge as loosely-shaped JSON; every field except
/// the type defaults so a partially-populated event still deserializes.
/// `count` is set when the ledger has already rolled the entry up, in which
/// case it carries the prior aggregate weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event_type: String,
    #[serde(default)]
    pub level: EventLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl AuditEvent {
    /// The human-readable reason attached to the event, if any.
    ///
    /// The ledger writes it under `reason`; older entries used `message`.
    pub fn reason_text(&self) -> Option<&str> {
        self.payload
            .get("reason")
            .or_else(|| self.payload.get("message"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Freshness metadata for one timeframe's bar series, as reported by the
/// snapshot-status provider. Read-only to this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeFrame {
    pub timeframe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bars_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at_ms: Option<i64>,
    /// Set by the provider when the series holds fewer bars than its
    /// configured minimum.
    #[serde(default)]
    pub short_history: bool,
}

/// The full snapshot-status payload for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStatus {
    pub symbol: String,
    #[serde(default)]
    pub frames: HashMap<String, TimeframeFrame>,
    /// Timeframes the provider explicitly reported as having no data.
    #[serde(default)]
    pub missing: Vec<String>,
    #[serde(default)]
    pub min_bars: u64,
}

/// A point-in-time quote for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<i64>,
}

impl Quote {
    /// Fills in `mid` and `spread` when both sides of the book are present
    /// and the provider left them blank.
    pub fn with_derived_fields(mut self) -> Self {
        if let (Some(bid), Some(ask)) = (self.bid, self.ask) {
            if self.spread.is_none() {
                self.spread = Some(ask - bid);
            }
            if self.mid.is_none() {
                self.mid = Some((bid + ask) / Decimal::from(2));
            }
        }
        self
    }
}

/// Normalizes a symbol for comparison: uppercase, alphanumerics only.
/// `"eur/usd"` and `"EURUSD.r"` both become `"EURUSD"`.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Clamps a requested row limit into an acceptable range.
pub fn clamp_limit(requested: Option<u64>, default: u64, min: u64, max: u64) -> u64 {
    requested.unwrap_or(default).clamp(min, max)
}
