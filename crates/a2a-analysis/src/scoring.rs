//! Indicator & scoring engine
//!
//! Turns a chronological price series into four component scores (risk,
//! momentum, trend, volume) and a weighted overall score, all clamped to
//! [0, 100]. The engine never degrades silently: a series shorter than the
//! minimum lookback is an `InsufficientData` error, not a default score.

use tracing::debug;

use crate::config::ScoringConfig;
use crate::error::{AnalysisError, Result};
use crate::indicators::{self, Bands};
use crate::market::Bar;

/// Indicator values extracted from the price series
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalSnapshot {
    pub current_price: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub rsi: f64,
    pub bands: Bands,
    /// Current volume over its trailing average
    pub volume_ratio: f64,
    /// Sample stddev of daily returns, in percent
    pub daily_volatility_pct: f64,
    pub atr: f64,
}

/// Component scores plus their weighted blend, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentScores {
    /// Higher means riskier; inverted when blended into the overall score
    pub risk: f64,
    pub momentum: f64,
    pub trend: f64,
    pub volume: f64,
    pub overall: f64,
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Weighted blend of the component scores, clamped to [0, 100]
///
/// Exposed separately so callers that adjust a component after the fact
/// (e.g. blending in event risk) can rebuild a consistent overall score.
pub fn overall_from_components(
    momentum: f64,
    trend: f64,
    risk: f64,
    volume: f64,
    config: &ScoringConfig,
) -> f64 {
    clamp_score(
        momentum * config.weight_momentum
            + trend * config.weight_trend
            + (100.0 - risk) * config.weight_risk
            + volume * config.weight_volume,
    )
}

/// Extract the indicator snapshot from a price series
pub fn compute_snapshot(bars: &[Bar], config: &ScoringConfig) -> Result<TechnicalSnapshot> {
    let min_bars = config.min_bars();
    if bars.len() < min_bars {
        return Err(AnalysisError::InsufficientData(format!(
            "scoring needs at least {min_bars} bars, got {}",
            bars.len()
        )));
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let current_price = closes[closes.len() - 1];

    let returns = indicators::simple_returns(&closes);
    let daily_volatility_pct = indicators::stddev(&returns) * 100.0;

    Ok(TechnicalSnapshot {
        current_price,
        sma_short: indicators::sma(&closes, config.sma_short_window)?,
        sma_long: indicators::sma(&closes, config.sma_long_window)?,
        rsi: indicators::wilder_rsi(&closes, config.rsi_period)?,
        bands: indicators::bollinger(&closes, config.bollinger_window, config.bollinger_k)?,
        volume_ratio: indicators::volume_ratio(&volumes, config.volume_window)?,
        daily_volatility_pct,
        atr: indicators::atr(bars, config.atr_period)?,
    })
}

/// Derive the component scores from an indicator snapshot
pub fn score_snapshot(snapshot: &TechnicalSnapshot, config: &ScoringConfig) -> ComponentScores {
    // Momentum: RSI distance from neutral, scaled.
    let momentum = clamp_score(50.0 + (snapshot.rsi - 50.0) * config.momentum_gain);

    // Trend: symmetric SMA cross plus price position against the short SMA.
    let mut trend = 50.0;
    trend += if snapshot.sma_short > snapshot.sma_long { 25.0 } else { -25.0 };
    trend += if snapshot.current_price > snapshot.sma_short { 25.0 } else { -25.0 };
    let trend = clamp_score(trend);

    // Risk: realized daily volatility, scaled so ~4% daily stddev saturates.
    let risk = clamp_score(snapshot.daily_volatility_pct * config.risk_vol_scale);

    // Volume: 1.0x the trailing average reads as 50, 2.0x saturates.
    let volume = clamp_score(snapshot.volume_ratio * 50.0);

    let overall = overall_from_components(momentum, trend, risk, volume, config);

    debug!(
        momentum = momentum,
        trend = trend,
        risk = risk,
        volume = volume,
        overall = overall,
        "component scores computed"
    );

    ComponentScores {
        risk,
        momentum,
        trend,
        volume,
        overall,
    }
}

/// Score a price series end to end
pub fn analyze_series(
    bars: &[Bar],
    config: &ScoringConfig,
) -> Result<(TechnicalSnapshot, ComponentScores)> {
    let snapshot = compute_snapshot(bars, config)?;
    let scores = score_snapshot(&snapshot, config);
    Ok((snapshot, scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fixtures::{bars_from_closes, rising_closes};

    fn assert_in_score_range(value: f64) {
        assert!((0.0..=100.0).contains(&value), "out of range: {value}");
    }

    fn assert_scores_clamped(scores: &ComponentScores) {
        assert_in_score_range(scores.risk);
        assert_in_score_range(scores.momentum);
        assert_in_score_range(scores.trend);
        assert_in_score_range(scores.volume);
        assert_in_score_range(scores.overall);
    }

    #[test]
    fn test_short_series_is_insufficient_data() {
        let config = ScoringConfig::default();
        let bars = bars_from_closes(&rising_closes(100.0, 1.0, 10), 1_000.0);
        let err = analyze_series(&bars, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_rising_series_scores_bullish() {
        let config = ScoringConfig::default();
        let bars = bars_from_closes(&rising_closes(100.0, 1.0, 30), 1_000.0);
        let (snapshot, scores) = analyze_series(&bars, &config).unwrap();

        assert!(snapshot.sma_short > snapshot.sma_long);
        assert!(snapshot.rsi > 70.0);
        assert!(scores.momentum > 70.0);
        assert_eq!(scores.trend, 100.0);
        assert!(scores.overall > 50.0);
        assert_scores_clamped(&scores);
    }

    #[test]
    fn test_falling_series_scores_bearish() {
        let config = ScoringConfig::default();
        let closes: Vec<f64> = (0..30).map(|i| 200.0 - i as f64).collect();
        let bars = bars_from_closes(&closes, 1_000.0);
        let (snapshot, scores) = analyze_series(&bars, &config).unwrap();

        assert!(snapshot.sma_short < snapshot.sma_long);
        assert_eq!(scores.trend, 0.0);
        assert!(scores.momentum < 30.0);
        assert!(scores.overall < 50.0);
        assert_scores_clamped(&scores);
    }

    #[test]
    fn test_flat_series_is_neutral_and_clamped() {
        let config = ScoringConfig::default();
        let bars = bars_from_closes(&vec![100.0; 30], 1_000.0);
        let (snapshot, scores) = analyze_series(&bars, &config).unwrap();

        assert!((snapshot.rsi - 50.0).abs() < 1e-9);
        assert_eq!(scores.risk, 0.0);
        assert!((scores.momentum - 50.0).abs() < 1e-9);
        assert_scores_clamped(&scores);
    }

    #[test]
    fn test_zero_volume_is_clamped() {
        let config = ScoringConfig::default();
        let bars = bars_from_closes(&rising_closes(50.0, 0.5, 30), 0.0);
        let (snapshot, scores) = analyze_series(&bars, &config).unwrap();

        assert_eq!(snapshot.volume_ratio, 0.0);
        assert_eq!(scores.volume, 0.0);
        assert_scores_clamped(&scores);
    }

    #[test]
    fn test_exact_minimum_lookback_is_accepted() {
        let config = ScoringConfig::default();
        let bars = bars_from_closes(&rising_closes(100.0, 0.5, config.min_bars()), 1_000.0);
        assert!(analyze_series(&bars, &config).is_ok());
    }
}
