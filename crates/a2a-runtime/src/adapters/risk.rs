//! Event risk analysis adapter

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use a2a_analysis::config::RiskConfig;
use a2a_analysis::error::{AnalysisError, Result};
use a2a_analysis::providers::EventFeed;
use a2a_analysis::risk::assess_events;
use a2a_core::Capability;
use a2a_core::payload::RiskRequest;

use super::Adapter;

/// Adapter wrapping the event risk scoring engine
pub struct RiskAdapter {
    feed: Arc<dyn EventFeed>,
    config: RiskConfig,
}

impl RiskAdapter {
    /// Create an adapter over the given event feed
    pub fn new(feed: Arc<dyn EventFeed>, config: RiskConfig) -> Self {
        Self { feed, config }
    }
}

#[async_trait]
impl Adapter for RiskAdapter {
    fn capability(&self) -> Capability {
        Capability::Risk
    }

    async fn handle(&self, payload: &Value) -> Result<Value> {
        let request: RiskRequest = serde_json::from_value(payload.clone())
            .map_err(|e| AnalysisError::InvalidInput(format!("malformed risk request: {e}")))?;

        let ticker = request.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "ticker must not be empty".to_string(),
            ));
        }

        let events = self
            .feed
            .get_events(&ticker, &request.event_sources, &request.time_horizon)
            .await?;
        debug!(
            ticker = %ticker,
            events = events.len(),
            threshold = ?request.severity_threshold,
            "events fetched for risk analysis"
        );

        let response = assess_events(&ticker, &events, request.severity_threshold, &self.config);
        serde_json::to_value(response)
            .map_err(|e| AnalysisError::Other(format!("response serialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_analysis::market::MarketEvent;
    use a2a_core::payload::{EventType, RiskLevel, RiskResponse, Severity};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    struct FixedFeed(Vec<MarketEvent>);

    #[async_trait]
    impl EventFeed for FixedFeed {
        async fn get_events(
            &self,
            _ticker: &str,
            _sources: &[String],
            _horizon: &str,
        ) -> Result<Vec<MarketEvent>> {
            Ok(self.0.clone())
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl EventFeed for FailingFeed {
        async fn get_events(
            &self,
            _ticker: &str,
            _sources: &[String],
            _horizon: &str,
        ) -> Result<Vec<MarketEvent>> {
            Err(AnalysisError::Provider("feed unavailable".to_string()))
        }
    }

    fn event(severity: Severity) -> MarketEvent {
        MarketEvent {
            title: "earnings miss".to_string(),
            description: String::new(),
            event_type: EventType::Financial,
            severity,
            source: "news".to_string(),
            published_date: Utc.with_ymd_and_hms(2026, 1, 28, 9, 0, 0).unwrap(),
        }
    }

    fn request(threshold: &str) -> Value {
        json!({
            "ticker": "tsla",
            "event_sources": ["news"],
            "time_horizon": "1d",
            "severity_threshold": threshold
        })
    }

    #[tokio::test]
    async fn test_events_are_scored_and_ticker_normalized() {
        let adapter = RiskAdapter::new(
            Arc::new(FixedFeed(vec![event(Severity::High), event(Severity::Medium)])),
            RiskConfig::default(),
        );
        let value = adapter.handle(&request("low")).await.unwrap();
        let response: RiskResponse = serde_json::from_value(value).unwrap();

        assert_eq!(response.ticker, "TSLA");
        assert_eq!(response.total_events, 2);
        assert_eq!(response.risk_factors, vec![EventType::Financial]);
    }

    #[tokio::test]
    async fn test_zero_surviving_events() {
        let adapter = RiskAdapter::new(
            Arc::new(FixedFeed(vec![event(Severity::Low)])),
            RiskConfig::default(),
        );
        let value = adapter.handle(&request("critical")).await.unwrap();
        let response: RiskResponse = serde_json::from_value(value).unwrap();

        assert_eq!(response.overall_risk_score, 0.0);
        assert_eq!(response.risk_level, RiskLevel::Low);
        assert_eq!(response.confidence_score, 0.0);
    }

    #[tokio::test]
    async fn test_feed_failure_propagates_as_provider_error() {
        let adapter = RiskAdapter::new(Arc::new(FailingFeed), RiskConfig::default());
        let err = adapter.handle(&request("low")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Provider(_)));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_invalid_input() {
        let adapter = RiskAdapter::new(Arc::new(FixedFeed(vec![])), RiskConfig::default());
        let err = adapter
            .handle(&json!({ "ticker": "AAPL" }))
            .await
            .unwrap_err();
        // severity_threshold is required
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }
}
