//! End-to-end loopback composition of the analysis runtime
//!
//! Wires stub collaborators, the three adapters, the worker pool, and the
//! correlation manager into one router, then drives a comprehensive
//! investment request (which chains a risk analysis through the client), a
//! portfolio request, and a heartbeat through it.
//!
//! Run with: cargo run -p a2a-runtime --example loopback

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use a2a_analysis::config::{PortfolioConfig, RiskConfig, ScoringConfig};
use a2a_analysis::error::Result as AnalysisResult;
use a2a_analysis::market::{Bar, MarketEvent, Quote};
use a2a_analysis::providers::{EventFeed, MarketDataProvider, PositionStore, ProfileStore};
use a2a_core::payload::{EventType, PositionData, Severity, UserProfile};
use a2a_core::{Capability, Envelope, Priority, codec};
use a2a_runtime::{
    A2aClient, CapabilityRouter, CorrelationManager, InvestmentAdapter, LoopbackSink,
    PortfolioAdapter, RiskAdapter, WorkerPool,
};

/// Market stub: every ticker rises 1 point a day for 60 days
struct DemoMarket;

#[async_trait]
impl MarketDataProvider for DemoMarket {
    async fn get_quote(&self, ticker: &str) -> AnalysisResult<Quote> {
        Ok(Quote {
            ticker: ticker.to_string(),
            price: 159.0,
            currency: "USD".to_string(),
        })
    }

    async fn get_history(&self, _t: &str, _p: &str, _i: &str) -> AnalysisResult<Vec<Bar>> {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        Ok((0..60)
            .map(|i| {
                let close = 100.0 + i as f64;
                Bar {
                    timestamp: start + Duration::days(i),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_200_000.0,
                }
            })
            .collect())
    }
}

/// Event feed stub: one regulatory event and one financial one
struct DemoFeed;

#[async_trait]
impl EventFeed for DemoFeed {
    async fn get_events(
        &self,
        ticker: &str,
        _sources: &[String],
        _horizon: &str,
    ) -> AnalysisResult<Vec<MarketEvent>> {
        Ok(vec![
            MarketEvent {
                title: format!("{ticker} faces regulatory review"),
                description: "Regulator opens a review of recent filings".to_string(),
                event_type: EventType::Regulatory,
                severity: Severity::Medium,
                source: "news".to_string(),
                published_date: Utc::now() - Duration::hours(8),
            },
            MarketEvent {
                title: format!("{ticker} revenue guidance trimmed"),
                description: "Company trims quarterly guidance".to_string(),
                event_type: EventType::Financial,
                severity: Severity::High,
                source: "filings".to_string(),
                published_date: Utc::now() - Duration::days(2),
            },
        ])
    }
}

struct DemoProfiles;

#[async_trait]
impl ProfileStore for DemoProfiles {
    async fn get_profile(&self, _user_id: &str) -> AnalysisResult<Option<UserProfile>> {
        Ok(Some(UserProfile::default()))
    }
}

struct DemoPositions;

#[async_trait]
impl PositionStore for DemoPositions {
    async fn get_positions(&self, _user_id: &str) -> AnalysisResult<Vec<PositionData>> {
        Ok(vec![
            PositionData {
                ticker: "AAPL".to_string(),
                quantity: 50.0,
                average_price: 120.0,
                sector: "technology".to_string(),
            },
            PositionData {
                ticker: "JPM".to_string(),
                quantity: 10.0,
                average_price: 130.0,
                sector: "financials".to_string(),
            },
        ])
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    a2a_utils::try_init_tracing();

    let market: Arc<dyn MarketDataProvider> = Arc::new(DemoMarket);
    let profiles: Arc<dyn ProfileStore> = Arc::new(DemoProfiles);
    let positions: Arc<dyn PositionStore> = Arc::new(DemoPositions);

    let correlation = Arc::new(CorrelationManager::new(Duration::seconds(30)));
    let workers = Arc::new(WorkerPool::new(8, 2));
    let router = Arc::new(CapabilityRouter::new(correlation.clone(), workers));

    // Risk and portfolio adapters first; the investment adapter chains risk
    // analyses through a client looped back into this same router.
    router.register(Arc::new(RiskAdapter::new(
        Arc::new(DemoFeed),
        RiskConfig::default(),
    )));
    router.register(Arc::new(PortfolioAdapter::new(
        market.clone(),
        positions,
        PortfolioConfig::default(),
    )));

    let chain = Arc::new(A2aClient::new(
        Capability::Investment.default_agent_id(),
        Arc::new(LoopbackSink::new(router.clone())),
        correlation.clone(),
    ));
    router.register(Arc::new(
        InvestmentAdapter::new(market, profiles, ScoringConfig::default())
            .with_risk_chain(chain),
    ));

    // Expiry sweeper, as the composition root would run it in production.
    {
        let correlation = correlation.clone();
        tokio::spawn(async move {
            correlation.run_sweeper(std::time::Duration::from_secs(1)).await;
        });
    }

    // 1. Comprehensive investment analysis (chains a risk request).
    let request = Envelope::request(
        "demo_client",
        "investment_agent_001",
        json!({
            "ticker": "AAPL",
            "analysis_type": "comprehensive",
            "timeframe": "3mo",
            "user_profile": { "risk_tolerance": "moderate" }
        }),
        Priority::High,
        Duration::seconds(30),
    );
    let reply = router.dispatch(request).await.expect("reply");
    println!("--- investment ---\n{}\n", codec::encode(&reply)?);

    // 2. Portfolio analysis from stored positions.
    let request = Envelope::request(
        "demo_client",
        "portfolio_agent_001",
        json!({ "user_id": "demo_user", "analysis_goals": ["risk_assessment"] }),
        Priority::Normal,
        Duration::seconds(30),
    );
    let reply = router.dispatch(request).await.expect("reply");
    println!("--- portfolio ---\n{}\n", codec::encode(&reply)?);

    // 3. Heartbeat.
    let probe = Envelope::heartbeat("demo_client", "risk_agent_001");
    let reply = router.dispatch(probe).await.expect("reply");
    println!("--- heartbeat ---\n{}", codec::encode(&reply)?);

    Ok(())
}
