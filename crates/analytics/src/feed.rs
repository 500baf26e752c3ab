use crate::error::AnalyticsError;
use core_types::{AuditEvent, EventLevel};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// The burst-collapsing window: events of the same kind landing within the
/// same 90-second bucket merge into one row.
pub const DEFAULT_WINDOW_MS: i64 = 90_000;

/// One burst-collapsed row of the change feed. Derived on every render pass
/// from the current filtered event list; never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedEvent {
    pub id: String,
    /// Sum of the contributing weights (an already-rolled-up event counts
    /// for its prior aggregate count, a plain event for one).
    pub count: u64,
    /// How many events the row hides beyond its sample. Always `count - 1`.
    pub suppressed_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_at_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_at_ms: Option<i64>,
    /// The newest event in the group, kept as the representative row.
    pub sample: AuditEvent,
}

/// The identity a burst is collapsed under. Strings are trimmed and
/// lower-cased so cosmetic differences do not split a burst.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    bucket: i64,
    event_type: String,
    level: EventLevel,
    symbol: String,
    reason: String,
}

impl GroupKey {
    fn for_event(event: &AuditEvent, window_ms: i64) -> Self {
        // Events without a usable timestamp all share bucket 0. Very old
        // events of the same kind can therefore merge with them; that
        // imprecision is intentional (see the product notes), not a defect.
        let bucket = event
            .created_at_ms
            .map(|ts| ts.div_euclid(window_ms))
            .unwrap_or(0);
        GroupKey {
            bucket,
            event_type: normalize(&event.event_type),
            level: event.level,
            symbol: normalize(event.symbol.as_deref().unwrap_or("")),
            reason: normalize(event.reason_text().unwrap_or("")),
        }
    }

    /// A stable synthesized id for groups whose sample has none, so repeated
    /// render passes over the same data keep the same row identities.
    fn synthesized_id(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        format!("agg-{}-{:016x}", self.bucket, hasher.finish())
    }
}

/// Collapses an unordered sequence of audit events into burst summaries,
/// most recent last-activity first.
pub fn collapse_bursts(
    events: &[AuditEvent],
    window_ms: i64,
) -> Result<Vec<AggregatedEvent>, AnalyticsError> {
    if window_ms <= 0 {
        return Err(AnalyticsError::InvalidWindow(window_ms));
    }

    // 1. Sort newest first, timestamp-less events last, so the first member
    //    of each group becomes its representative sample.
    let mut ordered: Vec<&AuditEvent> = events.iter().collect();
    ordered.sort_by(|a, b| match (b.created_at_ms, a.created_at_ms) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    });

    // 2. Merge weights per group key, tracking the timestamp span.
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<AggregatedEvent> = Vec::new();
    for event in ordered {
        let key = GroupKey::for_event(event, window_ms);
        let weight = event.count.filter(|c| *c >= 1).unwrap_or(1);
        match index.get(&key) {
            Some(&at) => {
                let group = &mut groups[at];
                group.count += weight;
                group.first_at_ms = min_opt(group.first_at_ms, event.created_at_ms);
                group.last_at_ms = max_opt(group.last_at_ms, event.created_at_ms);
            }
            None => {
                let id = event
                    .id
                    .clone()
                    .unwrap_or_else(|| key.synthesized_id());
                index.insert(key, groups.len());
                groups.push(AggregatedEvent {
                    id,
                    count: weight,
                    suppressed_count: 0,
                    first_at_ms: event.created_at_ms,
                    last_at_ms: event.created_at_ms,
                    sample: event.clone(),
                });
            }
        }
    }

    for group in &mut groups {
        group.suppressed_count = group.count.saturating_sub(1);
    }

    // 3. Order by last activity, newest first; groups with no timestamp sink
    //    to the bottom.
    groups.sort_by(|a, b| match (b.last_at_ms, a.last_at_ms) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    });

    tracing::debug!(
        input = events.len(),
        output = groups.len(),
        window_ms,
        "Collapsed change feed."
    );
    Ok(groups)
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn min_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (v, None) | (None, v) => v,
    }
}

fn max_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (v, None) | (None, v) => v,
    }
}
