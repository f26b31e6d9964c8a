//! Configuration for the analysis engines
//!
//! Every weighting constant and bucket threshold used by the engines is a
//! named field here rather than a magic number, so deployments can tune
//! them without touching engine code. The defaults are documented on each
//! field.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the indicator & scoring engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Short moving-average window (default 10 periods)
    pub sma_short_window: usize,
    /// Long moving-average window (default 20 periods)
    pub sma_long_window: usize,
    /// RSI lookback with Wilder smoothing (default 14, needs 15 closes)
    pub rsi_period: usize,
    /// Bollinger band window (default 20)
    pub bollinger_window: usize,
    /// Bollinger band width in standard deviations (default 2.0)
    pub bollinger_k: f64,
    /// Trailing window for the volume average (default 20)
    pub volume_window: usize,
    /// Average-true-range lookback used for price bands (default 14)
    pub atr_period: usize,

    /// Gain applied to (RSI - 50) when deriving the momentum score
    pub momentum_gain: f64,
    /// Multiplier mapping daily return stddev (percent) to the risk score
    pub risk_vol_scale: f64,

    /// Overall blend weight for momentum (default 0.30)
    pub weight_momentum: f64,
    /// Overall blend weight for trend (default 0.30)
    pub weight_trend: f64,
    /// Overall blend weight for inverted risk (default 0.25)
    pub weight_risk: f64,
    /// Overall blend weight for volume (default 0.15)
    pub weight_volume: f64,

    /// overall_score at or above which the action is STRONG_BUY
    pub strong_buy_threshold: f64,
    /// overall_score at or above which the action is BUY
    pub buy_threshold: f64,
    /// overall_score at or above which the action is HOLD
    pub hold_threshold: f64,
    /// overall_score at or above which the action is SELL (below: STRONG_SELL)
    pub sell_threshold: f64,
    /// Distance from a threshold at which confidence saturates to 1.0
    pub confidence_band: f64,
    /// Conservative profiles downgrade buy-side actions to HOLD when the
    /// risk score exceeds this value
    pub conservative_risk_cap: f64,
    /// Target price distance in ATR multiples
    pub target_atr_multiple: f64,
    /// Stop-loss distance in ATR multiples
    pub stop_atr_multiple: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            sma_short_window: 10,
            sma_long_window: 20,
            rsi_period: 14,
            bollinger_window: 20,
            bollinger_k: 2.0,
            volume_window: 20,
            atr_period: 14,
            momentum_gain: 1.0,
            risk_vol_scale: 25.0,
            weight_momentum: 0.30,
            weight_trend: 0.30,
            weight_risk: 0.25,
            weight_volume: 0.15,
            strong_buy_threshold: 85.0,
            buy_threshold: 65.0,
            hold_threshold: 45.0,
            sell_threshold: 25.0,
            confidence_band: 10.0,
            conservative_risk_cap: 50.0,
            target_atr_multiple: 2.0,
            stop_atr_multiple: 1.5,
        }
    }
}

impl ScoringConfig {
    /// Create a new configuration builder
    pub fn builder() -> ScoringConfigBuilder {
        ScoringConfigBuilder::default()
    }

    /// Minimum number of bars the engine needs before it will score at all
    ///
    /// The longest indicator window wins; RSI needs one extra close for the
    /// first delta.
    pub fn min_bars(&self) -> usize {
        self.sma_long_window
            .max(self.bollinger_window)
            .max(self.volume_window)
            .max(self.rsi_period + 1)
            .max(self.atr_period + 1)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.sma_short_window == 0 || self.sma_long_window == 0 {
            return Err(AnalysisError::InvalidInput(
                "moving-average windows must be positive".to_string(),
            ));
        }
        if self.sma_short_window >= self.sma_long_window {
            return Err(AnalysisError::InvalidInput(
                "sma_short_window must be shorter than sma_long_window".to_string(),
            ));
        }
        let weight_sum =
            self.weight_momentum + self.weight_trend + self.weight_risk + self.weight_volume;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(AnalysisError::InvalidInput(format!(
                "score weights must sum to 1.0, got {weight_sum}"
            )));
        }
        let descending = self.strong_buy_threshold > self.buy_threshold
            && self.buy_threshold > self.hold_threshold
            && self.hold_threshold > self.sell_threshold;
        if !descending {
            return Err(AnalysisError::InvalidInput(
                "action thresholds must be strictly descending".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for ScoringConfig
#[derive(Debug, Default)]
pub struct ScoringConfigBuilder {
    config: ScoringConfig,
}

impl ScoringConfigBuilder {
    /// Set the moving-average windows
    pub fn sma_windows(mut self, short: usize, long: usize) -> Self {
        self.config.sma_short_window = short;
        self.config.sma_long_window = long;
        self
    }

    /// Set the RSI period
    pub fn rsi_period(mut self, period: usize) -> Self {
        self.config.rsi_period = period;
        self
    }

    /// Set the overall blend weights (momentum, trend, risk, volume)
    pub fn weights(mut self, momentum: f64, trend: f64, risk: f64, volume: f64) -> Self {
        self.config.weight_momentum = momentum;
        self.config.weight_trend = trend;
        self.config.weight_risk = risk;
        self.config.weight_volume = volume;
        self
    }

    /// Set the action thresholds (strong_buy, buy, hold, sell)
    pub fn action_thresholds(
        mut self,
        strong_buy: f64,
        buy: f64,
        hold: f64,
        sell: f64,
    ) -> Self {
        self.config.strong_buy_threshold = strong_buy;
        self.config.buy_threshold = buy;
        self.config.hold_threshold = hold;
        self.config.sell_threshold = sell;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ScoringConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration for the event risk scoring engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Severity weight for low events (default 10)
    pub weight_low: f64,
    /// Severity weight for medium events (default 25)
    pub weight_medium: f64,
    /// Severity weight for high events (default 50)
    pub weight_high: f64,
    /// Severity weight for critical events (default 90)
    pub weight_critical: f64,

    /// Per-event multiplier for financial events
    pub factor_financial: f64,
    /// Per-event multiplier for legal events
    pub factor_legal: f64,
    /// Per-event multiplier for market events
    pub factor_market: f64,
    /// Per-event multiplier for operational events
    pub factor_operational: f64,
    /// Per-event multiplier for regulatory events
    pub factor_regulatory: f64,

    /// Per-event score at or above which an event counts as high risk
    pub high_risk_bar: f64,
    /// Overall bonus per high-risk event
    pub high_risk_bonus: f64,
    /// Cap on the accumulated high-risk bonus
    pub high_risk_bonus_cap: f64,

    /// Scores below this bucket as low
    pub bucket_medium: f64,
    /// Scores below this (and >= bucket_medium) bucket as medium
    pub bucket_high: f64,
    /// Scores below this (and >= bucket_high) bucket as high; above: critical
    pub bucket_critical: f64,

    /// Event count at which confidence saturates to 1.0
    pub confidence_ref_events: usize,
    /// How many recent events are echoed back in the response
    pub recent_events_limit: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weight_low: 10.0,
            weight_medium: 25.0,
            weight_high: 50.0,
            weight_critical: 90.0,
            factor_financial: 1.10,
            factor_legal: 1.25,
            factor_market: 1.0,
            factor_operational: 1.05,
            factor_regulatory: 1.15,
            high_risk_bar: 70.0,
            high_risk_bonus: 5.0,
            high_risk_bonus_cap: 20.0,
            bucket_medium: 30.0,
            bucket_high: 60.0,
            bucket_critical: 85.0,
            confidence_ref_events: 10,
            recent_events_limit: 5,
        }
    }
}

/// Configuration for the portfolio metrics engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// Annualized risk-free rate used by the Sharpe ratio (default 0.0)
    pub risk_free_rate: f64,
    /// Trading days per year used for annualization (default 252)
    pub trading_days: f64,
    /// A sector above this share of portfolio value triggers a rebalance
    /// recommendation (default 50%)
    pub concentration_threshold_pct: f64,
    /// Share of losing positions above which a loss review is recommended
    pub loss_review_ratio: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            trading_days: 252.0,
            concentration_threshold_pct: 50.0,
            loss_review_ratio: 0.6,
        }
    }
}
