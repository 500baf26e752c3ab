use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of an audit event as reported by the ledger service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    #[default]
    Info,
    #[serde(alias = "warning")]
    Warn,
    #[serde(alias = "err")]
    Error,
}

impl EventLevel {
    /// Parses a level string leniently. Anything unrecognized is treated as
    /// `Info` so a malformed event never breaks the feed.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "warn" | "warning" => EventLevel::Warn,
            "error" | "err" => EventLevel::Error,
            _ => EventLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Info => "info",
            EventLevel::Warn => "warn",
            EventLevel::Error => "error",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The chart timeframes the snapshot provider serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// The duration of one bar on this timeframe, in milliseconds.
    pub fn bar_duration_ms(&self) -> i64 {
        match self {
            Timeframe::M1 => 60_000,
            Timeframe::M5 => 5 * 60_000,
            Timeframe::M15 => 15 * 60_000,
            Timeframe::M30 => 30 * 60_000,
            Timeframe::H1 => 60 * 60_000,
            Timeframe::H4 => 4 * 60 * 60_000,
            Timeframe::D1 => 24 * 60 * 60_000,
        }
    }

    fn from_canonical(raw: &str) -> Option<Self> {
        match raw {
            "1m" => Some(Timeframe::M1),
            "5m" => Some(Timeframe::M5),
            "15m" => Some(Timeframe::M15),
            "30m" => Some(Timeframe::M30),
            "1h" => Some(Timeframe::H1),
            "4h" => Some(Timeframe::H4),
            "1d" => Some(Timeframe::D1),
            _ => None,
        }
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    /// Normalizes the resolution spellings the host UI sends: the canonical
    /// `"15m"` form, the letter-first `"M15"`/`"h1"` form, and bare minute
    /// counts (`"60"` means one hour).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let lowered = raw.trim().to_ascii_lowercase();
        if lowered.is_empty() {
            return Err(CoreError::InvalidInput(
                "timeframe".to_string(),
                "empty string".to_string(),
            ));
        }

        if let Some(tf) = Timeframe::from_canonical(&lowered) {
            return Ok(tf);
        }

        // Letter-first form: "m15" -> "15m", "h4" -> "4h".
        let mut chars = lowered.chars();
        if let Some(first) = chars.next() {
            let rest: String = chars.collect();
            if matches!(first, 'm' | 'h' | 'd') && !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
                if let Some(tf) = Timeframe::from_canonical(&format!("{rest}{first}")) {
                    return Ok(tf);
                }
            }
        }

        // Bare minute counts.
        if lowered.chars().all(|c| c.is_ascii_digit()) {
            let canonical = match lowered.as_str() {
                "60" => Some("1h".to_string()),
                "1" | "5" | "15" | "30" => Some(format!("{lowered}m")),
                _ => None,
            };
            if let Some(c) = canonical {
                if let Some(tf) = Timeframe::from_canonical(&c) {
                    return Ok(tf);
                }
            }
        }

        Err(CoreError::UnsupportedTimeframe(raw.trim().to_string()))
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
