use core_types::{SnapshotStatus, Timeframe};
use serde::Serialize;
use std::collections::HashMap;

/// Staleness category for one timeframe's bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessState {
    /// No frame data exists for the timeframe.
    Missing,
    /// The series exists but holds fewer bars than the configured minimum.
    Short,
    /// Updated within the target age.
    Fresh,
    /// Updated within twice the target age.
    Aging,
    /// Older than twice the target age.
    Stale,
    /// The frame has bars but no last-updated timestamp.
    Unknown,
}

impl FreshnessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreshnessState::Missing => "missing",
            FreshnessState::Short => "short",
            FreshnessState::Fresh => "fresh",
            FreshnessState::Aging => "aging",
            FreshnessState::Stale => "stale",
            FreshnessState::Unknown => "unknown",
        }
    }
}

/// The classification verdict for one requested timeframe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshnessReport {
    pub timeframe: String,
    pub state: FreshnessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<i64>,
}

/// Per-timeframe target ages. A series is `Fresh` while its age is within
/// the target, `Aging` within twice the target, `Stale` beyond that.
#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    default_target_ms: i64,
    target_ms: HashMap<String, i64>,
    min_bars: u64,
}

/// Grace period added on top of one bar duration when seeding the defaults:
/// a series is expected to lag by at most one bar plus provider latency.
const TARGET_GRACE_MS: i64 = 10 * 60_000;

/// History floor used when the provider does not report its own `min_bars`.
const DEFAULT_MIN_BARS: u64 = 50;

impl Default for FreshnessPolicy {
    fn default() -> Self {
        let mut target_ms = HashMap::new();
        for tf in Timeframe::ALL {
            target_ms.insert(tf.as_str().to_string(), tf.bar_duration_ms() + TARGET_GRACE_MS);
        }
        FreshnessPolicy {
            default_target_ms: TARGET_GRACE_MS,
            target_ms,
            min_bars: DEFAULT_MIN_BARS,
        }
    }
}

impl FreshnessPolicy {
    /// Replaces the fallback target used for timeframes the table does not
    /// name.
    pub fn with_default_target(mut self, target_ms: i64) -> Self {
        self.default_target_ms = target_ms;
        self
    }

    /// Overrides the target age for one timeframe label.
    pub fn with_target(mut self, timeframe: &str, target_ms: i64) -> Self {
        self.target_ms.insert(canonical_label(timeframe), target_ms);
        self
    }

    /// Replaces the history floor applied when the status carries none.
    pub fn with_min_bars(mut self, min_bars: u64) -> Self {
        self.min_bars = min_bars;
        self
    }

    /// The target age for a timeframe label, falling back to the default
    /// (ten minutes) for labels the table does not know.
    pub fn target_for(&self, timeframe: &str) -> i64 {
        self.target_ms
            .get(&canonical_label(timeframe))
            .copied()
            .unwrap_or(self.default_target_ms)
    }
}

/// Classifies each requested timeframe against the snapshot status.
///
/// Pure and deterministic in `(status, now_ms)`: no clock reads, no side
/// effects. Increasing a frame's recency can only move its state toward
/// `Fresh`, never away from it.
pub fn classify(
    status: &SnapshotStatus,
    timeframes: &[String],
    now_ms: i64,
    policy: &FreshnessPolicy,
) -> Vec<FreshnessReport> {
    timeframes
        .iter()
        .map(|label| classify_one(status, label, now_ms, policy))
        .collect()
}

fn classify_one(
    status: &SnapshotStatus,
    label: &str,
    now_ms: i64,
    policy: &FreshnessPolicy,
) -> FreshnessReport {
    let canonical = canonical_label(label);
    let frame = status
        .frames
        .get(label)
        .or_else(|| status.frames.get(&canonical));

    let Some(frame) = frame else {
        let reported = status
            .missing
            .iter()
            .any(|m| canonical_label(m) == canonical);
        let detail = if reported {
            "reported missing by provider"
        } else {
            "not reported by provider"
        };
        return FreshnessReport {
            timeframe: label.to_string(),
            state: FreshnessState::Missing,
            detail: Some(detail.to_string()),
            age_ms: None,
        };
    };

    if frame.short_history {
        let bars = frame.bars_count.unwrap_or(0);
        // A provider that omits its floor serializes min_bars as zero.
        let floor = if status.min_bars > 0 {
            status.min_bars
        } else {
            policy.min_bars
        };
        return FreshnessReport {
            timeframe: label.to_string(),
            state: FreshnessState::Short,
            detail: Some(format!("{}/{} bars", bars, floor)),
            age_ms: None,
        };
    }

    let Some(last_updated) = frame.last_updated_at_ms else {
        return FreshnessReport {
            timeframe: label.to_string(),
            state: FreshnessState::Unknown,
            detail: Some("no update timestamp".to_string()),
            age_ms: None,
        };
    };

    let age = now_ms.saturating_sub(last_updated);
    let target = policy.target_for(label);
    let state = if age <= target {
        FreshnessState::Fresh
    } else if age <= 2 * target {
        FreshnessState::Aging
    } else {
        FreshnessState::Stale
    };
    FreshnessReport {
        timeframe: label.to_string(),
        state,
        detail: Some(format!(
            "updated {} ago (target {})",
            humanize_ms(age),
            humanize_ms(target)
        )),
        age_ms: Some(age),
    }
}

/// Lower-cases and canonicalizes a timeframe label for table lookups, so
/// `"H1"` and `"1h"` resolve to the same target.
fn canonical_label(label: &str) -> String {
    label
        .parse::<Timeframe>()
        .map(|tf| tf.as_str().to_string())
        .unwrap_or_else(|_| label.trim().to_lowercase())
}

fn humanize_ms(ms: i64) -> String {
    let secs = ms / 1_000;
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3_600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h{:02}m", secs / 3_600, (secs % 3_600) / 60)
    } else {
        format!("{}d", secs / 86_400)
    }
}
