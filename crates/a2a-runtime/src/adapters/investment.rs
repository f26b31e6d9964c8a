//! Investment analysis adapter

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use a2a_analysis::config::ScoringConfig;
use a2a_analysis::error::{AnalysisError, Result};
use a2a_analysis::providers::{MarketDataProvider, ProfileStore};
use a2a_analysis::recommend;
use a2a_analysis::scoring::{self, overall_from_components};
use a2a_core::Capability;
use a2a_core::payload::{AnalysisType, InvestmentRequest, UserProfile};

use super::{Adapter, RiskQuery};

/// Adapter wrapping the indicator & scoring engine
///
/// Comprehensive requests additionally chain an event-risk analysis through
/// the injected [`RiskQuery`] and blend it into the risk score; the chained
/// call is advisory, so its failure degrades to a technical-only result
/// rather than failing the request.
pub struct InvestmentAdapter {
    market: Arc<dyn MarketDataProvider>,
    profiles: Arc<dyn ProfileStore>,
    risk_chain: Option<Arc<dyn RiskQuery>>,
    config: ScoringConfig,
}

impl InvestmentAdapter {
    /// Create an adapter over the given market data and profile store
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        profiles: Arc<dyn ProfileStore>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            market,
            profiles,
            risk_chain: None,
            config,
        }
    }

    /// Inject the outbound risk-analysis client used by comprehensive
    /// requests
    pub fn with_risk_chain(mut self, chain: Arc<dyn RiskQuery>) -> Self {
        self.risk_chain = Some(chain);
        self
    }

    /// Inline profile wins; otherwise look the user up; otherwise defaults
    async fn resolve_profile(&self, request: &InvestmentRequest) -> UserProfile {
        if let Some(profile) = &request.user_profile {
            return profile.clone();
        }
        if let Some(user_id) = &request.user_id {
            match self.profiles.get_profile(user_id).await {
                Ok(Some(profile)) => return profile,
                Ok(None) => debug!(user_id = %user_id, "no stored profile, using defaults"),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "profile lookup failed, using defaults");
                }
            }
        }
        UserProfile::default()
    }
}

#[async_trait]
impl Adapter for InvestmentAdapter {
    fn capability(&self) -> Capability {
        Capability::Investment
    }

    async fn handle(&self, payload: &Value) -> Result<Value> {
        let request: InvestmentRequest = serde_json::from_value(payload.clone())
            .map_err(|e| AnalysisError::InvalidInput(format!("malformed investment request: {e}")))?;

        let ticker = request.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "ticker must not be empty".to_string(),
            ));
        }
        if request.analysis_type == AnalysisType::Fundamental {
            return Err(AnalysisError::InvalidInput(
                "fundamental analysis is not served here; request technical or comprehensive"
                    .to_string(),
            ));
        }

        let bars = self
            .market
            .get_history(&ticker, &request.timeframe, "1d")
            .await?;
        let (snapshot, mut scores) = scoring::analyze_series(&bars, &self.config)?;

        // Comprehensive analysis folds the event-risk picture into the
        // risk component before recommending.
        let mut event_note = None;
        if request.analysis_type == AnalysisType::Comprehensive {
            match &self.risk_chain {
                Some(chain) => match chain.query_risk(&ticker).await {
                    Ok(risk) => {
                        let blended = scores.risk.max(risk.overall_risk_score);
                        scores.risk = blended;
                        scores.overall = overall_from_components(
                            scores.momentum,
                            scores.trend,
                            blended,
                            scores.volume,
                            &self.config,
                        );
                        event_note = Some(format!(
                            "event risk {:.0}/100 across {} recent events",
                            risk.overall_risk_score, risk.total_events
                        ));
                    }
                    Err(e) => {
                        warn!(ticker = %ticker, error = %e, "risk chain failed, continuing with technical risk only");
                    }
                },
                None => {
                    debug!(ticker = %ticker, "no risk chain configured, technical risk only");
                }
            }
        }

        let profile = self.resolve_profile(&request).await;
        let mut recommendation = recommend::recommend(&snapshot, &scores, &profile, &self.config);
        if let Some(note) = event_note {
            recommendation.reasoning.push_str("; ");
            recommendation.reasoning.push_str(&note);
        }

        let response = recommend::build_response(&ticker, &snapshot, &scores, recommendation);
        serde_json::to_value(response)
            .map_err(|e| AnalysisError::Other(format!("response serialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_analysis::market::{Bar, Quote};
    use a2a_core::payload::{
        InvestmentResponse, RiskLevel, RiskResponse, RiskTolerance, TradeAction,
    };
    use chrono::{Duration, TimeZone, Utc};
    use mockall::mock;
    use serde_json::json;

    mock! {
        pub Market {}

        #[async_trait]
        impl MarketDataProvider for Market {
            async fn get_quote(&self, ticker: &str) -> Result<Quote>;
            async fn get_history(
                &self,
                ticker: &str,
                period: &str,
                interval: &str,
            ) -> Result<Vec<Bar>>;
        }
    }

    mock! {
        pub Profiles {}

        #[async_trait]
        impl ProfileStore for Profiles {
            async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;
        }
    }

    struct FixedRisk(RiskResponse);

    #[async_trait]
    impl RiskQuery for FixedRisk {
        async fn query_risk(&self, _ticker: &str) -> Result<RiskResponse> {
            Ok(self.0.clone())
        }
    }

    fn rising_bars(len: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| {
                let close = 100.0 + i as f64;
                Bar {
                    timestamp: start + Duration::days(i as i64),
                    open: close * 0.995,
                    high: close * 1.01,
                    low: close * 0.99,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    fn technical_request(ticker: &str) -> Value {
        json!({
            "ticker": ticker,
            "analysis_type": "technical",
            "timeframe": "3mo",
            "user_profile": { "risk_tolerance": "moderate" }
        })
    }

    fn adapter_with_history(bars: Vec<Bar>) -> InvestmentAdapter {
        let mut market = MockMarket::new();
        market
            .expect_get_history()
            .returning(move |_, _, _| Ok(bars.clone()));
        let mut profiles = MockProfiles::new();
        profiles.expect_get_profile().returning(|_| Ok(None));
        InvestmentAdapter::new(
            Arc::new(market),
            Arc::new(profiles),
            ScoringConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_rising_series_yields_buy_side_action() {
        let adapter = adapter_with_history(rising_bars(30));
        let value = adapter.handle(&technical_request("AAPL")).await.unwrap();
        let response: InvestmentResponse = serde_json::from_value(value).unwrap();

        assert_eq!(response.ticker, "AAPL");
        assert!(response.overall_score > 50.0);
        assert!(matches!(
            response.recommendations[0].action,
            TradeAction::Buy | TradeAction::StrongBuy
        ));
        assert!(!response.recommendations[0].reasoning.is_empty());
    }

    #[tokio::test]
    async fn test_short_history_is_insufficient_data() {
        let adapter = adapter_with_history(rising_bars(5));
        let err = adapter.handle(&technical_request("AAPL")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[tokio::test]
    async fn test_fundamental_requests_are_rejected() {
        let adapter = adapter_with_history(rising_bars(30));
        let payload = json!({
            "ticker": "AAPL",
            "analysis_type": "fundamental",
            "user_profile": { "risk_tolerance": "moderate" }
        });
        let err = adapter.handle(&payload).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_empty_ticker_is_rejected() {
        let adapter = adapter_with_history(rising_bars(30));
        let err = adapter
            .handle(&technical_request("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_comprehensive_blends_event_risk() {
        let risk = RiskResponse {
            ticker: "AAPL".to_string(),
            overall_risk_score: 95.0,
            risk_level: RiskLevel::Critical,
            total_events: 4,
            high_risk_events: 3,
            risk_factors: vec![],
            recent_events: vec![],
            recommendations: vec![],
            confidence_score: 0.4,
        };
        let adapter =
            adapter_with_history(rising_bars(30)).with_risk_chain(Arc::new(FixedRisk(risk)));

        let payload = json!({
            "ticker": "AAPL",
            "analysis_type": "comprehensive",
            "user_profile": { "risk_tolerance": "moderate" }
        });
        let value = adapter.handle(&payload).await.unwrap();
        let response: InvestmentResponse = serde_json::from_value(value).unwrap();

        assert_eq!(response.risk_score, 95.0);
        assert!(response.recommendations[0].reasoning.contains("event risk"));

        // Technical-only baseline carries a far lower risk score.
        let technical = adapter_with_history(rising_bars(30));
        let baseline = technical
            .handle(&technical_request("AAPL"))
            .await
            .unwrap();
        let baseline: InvestmentResponse = serde_json::from_value(baseline).unwrap();
        assert!(baseline.risk_score < response.risk_score);
        assert!(baseline.overall_score > response.overall_score);
    }

    #[tokio::test]
    async fn test_stored_profile_is_used_when_not_inlined() {
        let mut market = MockMarket::new();
        let bars = rising_bars(30);
        market
            .expect_get_history()
            .returning(move |_, _, _| Ok(bars.clone()));
        let mut profiles = MockProfiles::new();
        profiles.expect_get_profile().returning(|_| {
            Ok(Some(UserProfile {
                risk_tolerance: RiskTolerance::Conservative,
                investment_horizon: None,
                trading_style: None,
            }))
        });
        let risk = RiskResponse {
            ticker: "AAPL".to_string(),
            overall_risk_score: 90.0,
            risk_level: RiskLevel::Critical,
            total_events: 2,
            high_risk_events: 2,
            risk_factors: vec![],
            recent_events: vec![],
            recommendations: vec![],
            confidence_score: 0.2,
        };
        let adapter = InvestmentAdapter::new(
            Arc::new(market),
            Arc::new(profiles),
            ScoringConfig::default(),
        )
        .with_risk_chain(Arc::new(FixedRisk(risk)));

        // High event risk plus the stored conservative profile downgrades
        // the rising-series buy to HOLD.
        let payload = json!({
            "ticker": "AAPL",
            "analysis_type": "comprehensive",
            "user_id": "u1"
        });
        let value = adapter.handle(&payload).await.unwrap();
        let response: InvestmentResponse = serde_json::from_value(value).unwrap();
        assert_eq!(response.recommendations[0].action, TradeAction::Hold);
    }
}
