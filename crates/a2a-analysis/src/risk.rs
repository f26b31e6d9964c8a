//! Event risk scoring engine
//!
//! Converts a set of market/news events into an overall risk score, a
//! bucketed level, and a fixed recommendation sentence per bucket. Events
//! below the caller's severity threshold are dropped before scoring.

use std::collections::BTreeSet;

use a2a_core::payload::{EventType, RiskLevel, RiskResponse, ScoredEvent, Severity};
use tracing::debug;

use crate::config::RiskConfig;
use crate::market::MarketEvent;

impl RiskConfig {
    fn severity_weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Low => self.weight_low,
            Severity::Medium => self.weight_medium,
            Severity::High => self.weight_high,
            Severity::Critical => self.weight_critical,
        }
    }

    fn type_factor(&self, event_type: EventType) -> f64 {
        match event_type {
            EventType::Financial => self.factor_financial,
            EventType::Legal => self.factor_legal,
            EventType::Market => self.factor_market,
            EventType::Operational => self.factor_operational,
            EventType::Regulatory => self.factor_regulatory,
        }
    }
}

/// Fixed recommendation sentence for a risk bucket
pub fn recommendation_for_level(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Risk is low. The environment is relatively safe for investment.",
        RiskLevel::Medium => "Risk is moderate. Apply standard risk management.",
        RiskLevel::High => "Risk is elevated. A cautious approach is required.",
        RiskLevel::Critical => "Risk is very high. Re-evaluate exposure to this ticker.",
    }
}

/// Bucket a continuous risk score into a coarse level
pub fn bucket_risk_score(score: f64, config: &RiskConfig) -> RiskLevel {
    if score < config.bucket_medium {
        RiskLevel::Low
    } else if score < config.bucket_high {
        RiskLevel::Medium
    } else if score < config.bucket_critical {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

/// Per-event risk score: severity weight scaled by the event-type factor
fn score_event(event: &MarketEvent, config: &RiskConfig) -> f64 {
    (config.severity_weight(event.severity) * config.type_factor(event.event_type))
        .clamp(0.0, 100.0)
}

/// Assess the event-driven risk for a ticker
///
/// `overall_risk_score` is the mean severity weight of the surviving events
/// plus a capped bonus for each high-risk event, clamped to [0, 100]. With
/// no surviving events the score is 0 and the level is low.
pub fn assess_events(
    ticker: &str,
    events: &[MarketEvent],
    severity_threshold: Severity,
    config: &RiskConfig,
) -> RiskResponse {
    let mut surviving: Vec<&MarketEvent> = events
        .iter()
        .filter(|e| e.severity >= severity_threshold)
        .collect();
    // Newest first, so the echoed events are the most recent ones.
    surviving.sort_by(|a, b| b.published_date.cmp(&a.published_date));

    let total_events = surviving.len();
    debug!(
        ticker = ticker,
        considered = events.len(),
        surviving = total_events,
        "scoring risk events"
    );

    let scored: Vec<(f64, &MarketEvent)> = surviving
        .iter()
        .map(|e| (score_event(e, config), *e))
        .collect();

    let high_risk_events = scored
        .iter()
        .filter(|(score, _)| *score >= config.high_risk_bar)
        .count();

    let overall_risk_score = if total_events == 0 {
        0.0
    } else {
        let mean_weight = surviving
            .iter()
            .map(|e| config.severity_weight(e.severity))
            .sum::<f64>()
            / total_events as f64;
        let bonus = (high_risk_events as f64 * config.high_risk_bonus)
            .min(config.high_risk_bonus_cap);
        (mean_weight + bonus).clamp(0.0, 100.0)
    };

    let risk_level = bucket_risk_score(overall_risk_score, config);

    let risk_factors: Vec<EventType> = surviving
        .iter()
        .map(|e| e.event_type)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let recent_events: Vec<ScoredEvent> = scored
        .iter()
        .take(config.recent_events_limit)
        .map(|(score, e)| ScoredEvent {
            title: e.title.clone(),
            event_type: e.event_type,
            severity: e.severity,
            risk_score: *score,
            source: e.source.clone(),
            published_date: e.published_date,
        })
        .collect();

    let confidence_score =
        (total_events as f64 / config.confidence_ref_events as f64).min(1.0);

    RiskResponse {
        ticker: ticker.to_string(),
        overall_risk_score,
        risk_level,
        total_events,
        high_risk_events,
        risk_factors,
        recent_events,
        recommendations: vec![recommendation_for_level(risk_level).to_string()],
        confidence_score,
    }
}
