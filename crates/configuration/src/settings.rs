use serde::Deserialize;
use std::collections::HashMap;

/// The root configuration structure for the panel layer.
///
/// Every field is serde-defaulted: the panels must come up in a degraded but
/// working state with no configuration file at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bridge: BridgeConfig,
    pub feed: FeedConfig,
    pub freshness: FreshnessConfig,
    pub ui: UiConfig,
}

/// Where the ledger bridge listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the local bridge process.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            // The bridge binds loopback on 8001 unless overridden.
            base_url: "http://127.0.0.1:8001".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Parameters for the change-feed panel.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Burst-collapsing window in milliseconds.
    pub window_ms: i64,
    /// How many raw entries one refresh requests.
    pub default_limit: u64,
    pub max_limit: u64,
    /// The default lookback window for the range selector.
    pub default_range_hours: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            window_ms: 90_000,
            default_limit: 200,
            max_limit: 2_000,
            default_range_hours: 24,
        }
    }
}

/// Parameters for the snapshot freshness classifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    /// How many bars a series must hold before it counts as full history.
    /// Used when the provider omits its own floor.
    pub min_bars: u64,
    /// Target age for timeframes the override table does not name.
    pub default_target_age_ms: i64,
    /// Per-timeframe target-age overrides, keyed by timeframe label.
    pub target_ages_ms: HashMap<String, i64>,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            min_bars: 50,
            default_target_age_ms: 10 * 60_000,
            target_ages_ms: HashMap::new(),
        }
    }
}

/// Interactive behavior of the panel shells.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Debounce applied to interactive search, in milliseconds.
    pub debounce_ms: u64,
    /// Where the best-effort panel preferences blob lives.
    pub prefs_path: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            prefs_path: ".glass-panels/prefs.json".to_string(),
        }
    }
}
