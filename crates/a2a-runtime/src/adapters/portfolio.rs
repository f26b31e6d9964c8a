//! Portfolio analysis adapter

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use a2a_analysis::config::PortfolioConfig;
use a2a_analysis::error::{AnalysisError, Result};
use a2a_analysis::portfolio::analyze_portfolio;
use a2a_analysis::providers::{MarketDataProvider, PositionStore};
use a2a_core::Capability;
use a2a_core::payload::PortfolioRequest;

use super::Adapter;

/// Goal tags for which the adapter fetches the benchmark series
const BETA_GOALS: [&str; 2] = ["beta", "risk_assessment"];

/// Adapter wrapping the portfolio metrics engine
///
/// Positions come inline with the request; when absent they are looked up
/// in the injected position store. The benchmark series for beta is fetched
/// from market data only when a goal asks for it.
pub struct PortfolioAdapter {
    market: Arc<dyn MarketDataProvider>,
    positions: Arc<dyn PositionStore>,
    config: PortfolioConfig,
    /// Range of history fetched per ticker
    history_period: String,
    /// Ticker whose series stands in for the market, e.g. "SPY"
    benchmark_ticker: Option<String>,
}

impl PortfolioAdapter {
    /// Create an adapter over the given market data and position store
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        positions: Arc<dyn PositionStore>,
        config: PortfolioConfig,
    ) -> Self {
        Self {
            market,
            positions,
            config,
            history_period: "3mo".to_string(),
            benchmark_ticker: Some("SPY".to_string()),
        }
    }

    /// Override the benchmark ticker (None disables beta entirely)
    pub fn with_benchmark_ticker(mut self, ticker: Option<String>) -> Self {
        self.benchmark_ticker = ticker;
        self
    }

    /// Override the history range fetched per ticker
    pub fn with_history_period(mut self, period: impl Into<String>) -> Self {
        self.history_period = period.into();
        self
    }
}

#[async_trait]
impl Adapter for PortfolioAdapter {
    fn capability(&self) -> Capability {
        Capability::Portfolio
    }

    async fn handle(&self, payload: &Value) -> Result<Value> {
        let request: PortfolioRequest = serde_json::from_value(payload.clone())
            .map_err(|e| AnalysisError::InvalidInput(format!("malformed portfolio request: {e}")))?;

        if request.user_id.trim().is_empty() {
            return Err(AnalysisError::InvalidInput(
                "user_id must not be empty".to_string(),
            ));
        }

        // Inline positions win; otherwise fall back to the stored portfolio.
        let mut data = request.portfolio_data.clone();
        if data.positions.is_empty() {
            data.positions = self.positions.get_positions(&request.user_id).await?;
            debug!(
                user_id = %request.user_id,
                positions = data.positions.len(),
                "loaded stored positions"
            );
        }

        let mut history: HashMap<String, Vec<f64>> = HashMap::new();
        for position in &data.positions {
            if history.contains_key(&position.ticker) {
                continue;
            }
            let bars = self
                .market
                .get_history(&position.ticker, &self.history_period, "1d")
                .await?;
            history.insert(
                position.ticker.clone(),
                bars.iter().map(|b| b.close).collect(),
            );
        }

        let beta_requested = request
            .analysis_goals
            .iter()
            .any(|goal| BETA_GOALS.contains(&goal.as_str()));
        let benchmark = match (&self.benchmark_ticker, beta_requested) {
            (Some(ticker), true) => {
                let bars = self
                    .market
                    .get_history(ticker, &self.history_period, "1d")
                    .await?;
                Some(bars.iter().map(|b| b.close).collect::<Vec<f64>>())
            }
            _ => None,
        };

        let response = analyze_portfolio(
            &request.user_id,
            &data,
            &history,
            benchmark.as_deref(),
            &request.analysis_goals,
            &self.config,
        )?;
        serde_json::to_value(response)
            .map_err(|e| AnalysisError::Other(format!("response serialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_analysis::market::{Bar, Quote};
    use a2a_core::payload::{PortfolioResponse, PositionData};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    /// Market stub serving a gently drifting series per ticker
    struct TrendMarket(HashMap<String, f64>);

    #[async_trait]
    impl MarketDataProvider for TrendMarket {
        async fn get_quote(&self, ticker: &str) -> Result<Quote> {
            let price = *self
                .0
                .get(ticker)
                .ok_or_else(|| AnalysisError::Provider(format!("unknown ticker {ticker}")))?;
            Ok(Quote {
                ticker: ticker.to_string(),
                price,
                currency: "USD".to_string(),
            })
        }

        async fn get_history(&self, ticker: &str, _p: &str, _i: &str) -> Result<Vec<Bar>> {
            let price = *self
                .0
                .get(ticker)
                .ok_or_else(|| AnalysisError::Provider(format!("unknown ticker {ticker}")))?;
            let start = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
            Ok((0..10)
                .map(|i| {
                    let close = price * (1.0 + 0.01 * i as f64);
                    Bar {
                        timestamp: start + Duration::days(i),
                        open: close,
                        high: close * 1.01,
                        low: close * 0.99,
                        close,
                        volume: 1_000.0,
                    }
                })
                .collect())
        }
    }

    struct StoredPositions(Vec<PositionData>);

    #[async_trait]
    impl PositionStore for StoredPositions {
        async fn get_positions(&self, _user_id: &str) -> Result<Vec<PositionData>> {
            Ok(self.0.clone())
        }
    }

    fn market() -> Arc<TrendMarket> {
        let mut prices = HashMap::new();
        prices.insert("AAPL".to_string(), 170.0);
        prices.insert("JPM".to_string(), 150.0);
        prices.insert("SPY".to_string(), 500.0);
        Arc::new(TrendMarket(prices))
    }

    fn inline_request() -> Value {
        json!({
            "user_id": "u1",
            "portfolio_data": {
                "positions": [
                    { "ticker": "AAPL", "quantity": 40.0, "average_price": 150.0, "sector": "technology" },
                    { "ticker": "JPM", "quantity": 10.0, "average_price": 140.0, "sector": "financials" }
                ],
                "cash": 500.0
            },
            "analysis_goals": ["rebalancing"]
        })
    }

    #[tokio::test]
    async fn test_concentrated_portfolio_gets_rebalance() {
        let adapter = PortfolioAdapter::new(
            market(),
            Arc::new(StoredPositions(vec![])),
            PortfolioConfig::default(),
        );
        let value = adapter.handle(&inline_request()).await.unwrap();
        let response: PortfolioResponse = serde_json::from_value(value).unwrap();

        // AAPL carries roughly 77% of total value in technology.
        let rebalance = response
            .recommendations
            .iter()
            .find(|r| r.action == "REBALANCE")
            .expect("expected a REBALANCE recommendation");
        assert!(rebalance.reasoning.contains("technology"));

        let sum: f64 = response.sector_allocation.values().sum();
        assert!((sum - 100.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_stored_positions_used_when_inline_empty() {
        let stored = vec![PositionData {
            ticker: "AAPL".to_string(),
            quantity: 5.0,
            average_price: 160.0,
            sector: "technology".to_string(),
        }];
        let adapter = PortfolioAdapter::new(
            market(),
            Arc::new(StoredPositions(stored)),
            PortfolioConfig::default(),
        );
        let value = adapter
            .handle(&json!({ "user_id": "u1" }))
            .await
            .unwrap();
        let response: PortfolioResponse = serde_json::from_value(value).unwrap();
        assert_eq!(response.performance_metrics.win_rate, 100.0);
    }

    #[tokio::test]
    async fn test_empty_everything_is_invalid_input() {
        let adapter = PortfolioAdapter::new(
            market(),
            Arc::new(StoredPositions(vec![])),
            PortfolioConfig::default(),
        );
        let err = adapter
            .handle(&json!({ "user_id": "u1" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_beta_fetched_for_risk_assessment_goal() {
        let adapter = PortfolioAdapter::new(
            market(),
            Arc::new(StoredPositions(vec![])),
            PortfolioConfig::default(),
        );
        let mut request = inline_request();
        request["analysis_goals"] = json!(["risk_assessment"]);
        let value = adapter.handle(&request).await.unwrap();
        let response: PortfolioResponse = serde_json::from_value(value).unwrap();
        assert!(response.risk_metrics.beta.is_some());
    }

    #[tokio::test]
    async fn test_beta_requested_without_benchmark_fails() {
        let adapter = PortfolioAdapter::new(
            market(),
            Arc::new(StoredPositions(vec![])),
            PortfolioConfig::default(),
        )
        .with_benchmark_ticker(None);
        let mut request = inline_request();
        request["analysis_goals"] = json!(["beta"]);
        let err = adapter.handle(&request).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }
}
