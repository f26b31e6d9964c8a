//! Market data model consumed by the engines

use a2a_core::payload::{EventType, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bar of a price series, chronological order assumed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A current quote for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: String,
    pub price: f64,
    pub currency: String,
}

/// A market/news event as delivered by the event feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub event_type: EventType,
    pub severity: Severity,
    pub source: String,
    pub published_date: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::Duration;

    /// Build a synthetic daily close series as bars, with volumes
    pub fn bars_from_closes(closes: &[f64], volume: f64) -> Vec<Bar> {
        let start = DateTime::parse_from_rfc3339("2026-01-05T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: close * 0.995,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume,
            })
            .collect()
    }

    /// A steadily rising close series of `len` bars starting at `start`
    pub fn rising_closes(start: f64, step: f64, len: usize) -> Vec<f64> {
        (0..len).map(|i| start + step * i as f64).collect()
    }
}
