//! Capability-specific payload schemas
//!
//! These are the typed bodies carried inside request and response
//! envelopes. Deserialization ignores unknown fields so that newer peers
//! can extend payloads without breaking older ones.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorCode;

fn default_timeframe() -> String {
    "3mo".to_string()
}

fn default_time_horizon() -> String {
    "1d".to_string()
}

// ---------------------------------------------------------------------------
// Shared vocabulary
// ---------------------------------------------------------------------------

/// Investor risk tolerance from the user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

/// User investment profile attached to investment requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub risk_tolerance: RiskTolerance,
    /// e.g. "short_term", "long_term"
    #[serde(default)]
    pub investment_horizon: Option<String>,
    /// e.g. "day_trading", "swing_trading", "position_trading"
    #[serde(default)]
    pub trading_style: Option<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            risk_tolerance: RiskTolerance::Moderate,
            investment_horizon: None,
            trading_style: None,
        }
    }
}

/// Trade action recommended to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

/// Event severity, ordered low < medium < high < critical
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Coarse risk bucket derived from a continuous risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Category tag of a market/news event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Financial,
    Legal,
    Market,
    Operational,
    Regulatory,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Legal => "legal",
            Self::Market => "market",
            Self::Operational => "operational",
            Self::Regulatory => "regulatory",
        }
    }
}

// ---------------------------------------------------------------------------
// Investment analysis
// ---------------------------------------------------------------------------

/// Kind of investment analysis requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Technical,
    Fundamental,
    Comprehensive,
}

/// Request payload for the investment capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRequest {
    pub ticker: String,
    pub analysis_type: AnalysisType,
    /// History range fetched for the analysis, e.g. "1mo", "3mo", "1y"
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Inline profile; takes precedence over a stored one
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    /// Used to look the profile up when none is inlined
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A single recommendation inside an investment response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: TradeAction,
    /// Normalized distance of the overall score from the nearest decision
    /// threshold, in [0, 1]
    pub confidence: f64,
    /// Deterministic, templated description of the driving signals
    pub reasoning: String,
    pub target_price: f64,
    pub stop_loss: f64,
}

/// Response payload for the investment capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentResponse {
    pub ticker: String,
    pub current_price: f64,
    /// Weighted blend of the component scores, in [0, 100]
    pub overall_score: f64,
    pub risk_score: f64,
    pub momentum_score: f64,
    pub trend_score: f64,
    pub recommendations: Vec<Recommendation>,
}

// ---------------------------------------------------------------------------
// Risk analysis
// ---------------------------------------------------------------------------

/// Request payload for the risk capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRequest {
    pub ticker: String,
    /// Source names the event feed should consult, e.g. "news", "filings"
    #[serde(default)]
    pub event_sources: Vec<String>,
    #[serde(default = "default_time_horizon")]
    pub time_horizon: String,
    pub severity_threshold: Severity,
}

/// One scored event echoed back in a risk response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvent {
    pub title: String,
    pub event_type: EventType,
    pub severity: Severity,
    /// Per-event risk score in [0, 100]
    pub risk_score: f64,
    pub source: String,
    pub published_date: DateTime<Utc>,
}

/// Response payload for the risk capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResponse {
    pub ticker: String,
    pub overall_risk_score: f64,
    pub risk_level: RiskLevel,
    /// Events considered (after severity filtering)
    pub total_events: usize,
    /// Events whose individual score reached the high-risk bar
    pub high_risk_events: usize,
    /// Distinct event-type tags present above the threshold
    pub risk_factors: Vec<EventType>,
    pub recent_events: Vec<ScoredEvent>,
    /// Fixed sentence(s) for the risk bucket
    pub recommendations: Vec<String>,
    /// Shrinks toward 0 as fewer events back the assessment, in [0, 1]
    pub confidence_score: f64,
}

// ---------------------------------------------------------------------------
// Portfolio analysis
// ---------------------------------------------------------------------------

/// One position inside a portfolio request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionData {
    pub ticker: String,
    pub quantity: f64,
    pub average_price: f64,
    pub sector: String,
}

/// Positions plus cash balance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioData {
    #[serde(default)]
    pub positions: Vec<PositionData>,
    #[serde(default)]
    pub cash: f64,
}

/// Request payload for the portfolio capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRequest {
    pub user_id: String,
    #[serde(default)]
    pub portfolio_data: PortfolioData,
    /// Tags such as "risk_assessment", "rebalancing", "beta"
    #[serde(default)]
    pub analysis_goals: Vec<String>,
}

/// Risk metrics block of a portfolio response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Standard deviation of daily portfolio returns (fraction)
    pub volatility: f64,
    /// Largest peak-to-trough decline of portfolio value (fraction)
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    /// Present only when a benchmark series was available
    pub beta: Option<f64>,
}

/// Performance metrics block of a portfolio response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Unrealized P/L over invested capital, percent
    pub total_return: f64,
    /// Annualized from mean daily return, percent
    pub annualized_return: f64,
    /// Share of positions currently profitable, percent
    pub win_rate: f64,
}

/// A portfolio-level recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRecommendation {
    /// e.g. "REBALANCE", "REVIEW_LOSERS", "HOLD"
    pub action: String,
    pub reasoning: String,
    pub confidence: f64,
}

/// Response payload for the portfolio capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResponse {
    pub user_id: String,
    pub overall_score: f64,
    pub risk_metrics: RiskMetrics,
    pub performance_metrics: PerformanceMetrics,
    pub recommendations: Vec<PortfolioRecommendation>,
    /// Sector name → percent of total value; sums to 100 within rounding
    pub sector_allocation: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Payload of every error envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error_code: ErrorCode,
    pub error_message: String,
    /// The offending request payload, echoed for caller debugging
    #[serde(default)]
    pub original_request: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_payload_fields_are_ignored() {
        let raw = json!({
            "ticker": "AAPL",
            "analysis_type": "comprehensive",
            "timeframe": "3mo",
            "user_profile": { "risk_tolerance": "moderate" },
            "some_future_field": { "nested": true }
        });

        let req: InvestmentRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(req.ticker, "AAPL");
        assert_eq!(req.analysis_type, AnalysisType::Comprehensive);
        let profile = req.user_profile.expect("inline profile");
        assert_eq!(profile.risk_tolerance, RiskTolerance::Moderate);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_trade_action_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&TradeAction::StrongBuy).unwrap(),
            "\"STRONG_BUY\""
        );
        let back: TradeAction = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(back, TradeAction::Sell);
    }

    #[test]
    fn test_portfolio_request_defaults() {
        let raw = json!({ "user_id": "u1" });
        let req: PortfolioRequest = serde_json::from_value(raw).unwrap();
        assert!(req.portfolio_data.positions.is_empty());
        assert_eq!(req.portfolio_data.cash, 0.0);
        assert!(req.analysis_goals.is_empty());
    }
}
