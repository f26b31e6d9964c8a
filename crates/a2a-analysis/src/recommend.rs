//! Recommendation derivation from scored series
//!
//! Maps the overall score and the caller's risk tolerance to a trade action
//! through fixed thresholds, with a confidence equal to the normalized
//! distance from the nearest threshold. Reasoning strings are templated
//! from the same signals that drive the action, so they are deterministic
//! and testable.

use a2a_core::payload::{
    InvestmentResponse, Recommendation, RiskTolerance, TradeAction, UserProfile,
};

use crate::config::ScoringConfig;
use crate::scoring::{ComponentScores, TechnicalSnapshot};

/// Pick the action for an overall score under the configured thresholds
fn action_for_score(overall: f64, config: &ScoringConfig) -> TradeAction {
    if overall >= config.strong_buy_threshold {
        TradeAction::StrongBuy
    } else if overall >= config.buy_threshold {
        TradeAction::Buy
    } else if overall >= config.hold_threshold {
        TradeAction::Hold
    } else if overall >= config.sell_threshold {
        TradeAction::Sell
    } else {
        TradeAction::StrongSell
    }
}

/// Normalized distance of the score from the nearest decision threshold
fn confidence_for_score(overall: f64, config: &ScoringConfig) -> f64 {
    let thresholds = [
        config.strong_buy_threshold,
        config.buy_threshold,
        config.hold_threshold,
        config.sell_threshold,
    ];
    let nearest = thresholds
        .iter()
        .map(|t| (overall - t).abs())
        .fold(f64::MAX, f64::min);
    (nearest / config.confidence_band).clamp(0.0, 1.0)
}

fn is_buy_side(action: TradeAction) -> bool {
    matches!(action, TradeAction::StrongBuy | TradeAction::Buy)
}

/// Templated description of the signals driving the action
fn build_reasoning(
    action: TradeAction,
    snapshot: &TechnicalSnapshot,
    scores: &ComponentScores,
    config: &ScoringConfig,
    downgraded: bool,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if snapshot.rsi >= 70.0 {
        parts.push(format!("RSI {:.1} is in overbought territory", snapshot.rsi));
    } else if snapshot.rsi <= 30.0 {
        parts.push(format!("RSI {:.1} is in oversold territory", snapshot.rsi));
    } else if snapshot.rsi > 50.0 {
        parts.push(format!("RSI {:.1} shows positive momentum", snapshot.rsi));
    } else {
        parts.push(format!("RSI {:.1} shows fading momentum", snapshot.rsi));
    }

    if snapshot.sma_short > snapshot.sma_long {
        parts.push(format!(
            "{}-period average is above the {}-period average",
            config.sma_short_window, config.sma_long_window
        ));
    } else {
        parts.push(format!(
            "{}-period average is below the {}-period average",
            config.sma_short_window, config.sma_long_window
        ));
    }

    if snapshot.current_price > snapshot.bands.upper {
        parts.push("price is stretched above the upper Bollinger band".to_string());
    } else if snapshot.current_price < snapshot.bands.lower {
        parts.push("price has slipped below the lower Bollinger band".to_string());
    }

    if snapshot.volume_ratio >= 1.5 {
        parts.push(format!(
            "volume is running {:.1}x its trailing average",
            snapshot.volume_ratio
        ));
    }

    if downgraded {
        parts.push(format!(
            "downgraded to HOLD for a conservative profile with risk score {:.0}",
            scores.risk
        ));
    }

    match action {
        TradeAction::StrongBuy | TradeAction::Buy => {
            parts.push("signals favor accumulation".to_string());
        }
        TradeAction::Hold => parts.push("no clear directional edge".to_string()),
        TradeAction::Sell | TradeAction::StrongSell => {
            parts.push("signals favor reducing exposure".to_string());
        }
    }

    parts.join("; ")
}

/// Derive the recommendation for a scored series and user profile
pub fn recommend(
    snapshot: &TechnicalSnapshot,
    scores: &ComponentScores,
    profile: &UserProfile,
    config: &ScoringConfig,
) -> Recommendation {
    let mut action = action_for_score(scores.overall, config);

    // Conservative investors step back from buy signals on risky names.
    let downgraded = profile.risk_tolerance == RiskTolerance::Conservative
        && is_buy_side(action)
        && scores.risk > config.conservative_risk_cap;
    if downgraded {
        action = TradeAction::Hold;
    }

    let confidence = confidence_for_score(scores.overall, config);
    let reasoning = build_reasoning(action, snapshot, scores, config, downgraded);

    // Price bands proportional to realized volatility.
    let price = snapshot.current_price;
    let target_band = snapshot.atr * config.target_atr_multiple;
    let stop_band = snapshot.atr * config.stop_atr_multiple;
    let (target_price, stop_loss) = match action {
        TradeAction::Sell | TradeAction::StrongSell => {
            (price - target_band, price + stop_band)
        }
        _ => (price + target_band, price - stop_band),
    };

    Recommendation {
        action,
        confidence,
        reasoning,
        target_price,
        stop_loss,
    }
}

/// Assemble the full investment response payload
pub fn build_response(
    ticker: impl Into<String>,
    snapshot: &TechnicalSnapshot,
    scores: &ComponentScores,
    recommendation: Recommendation,
) -> InvestmentResponse {
    InvestmentResponse {
        ticker: ticker.into(),
        current_price: snapshot.current_price,
        overall_score: scores.overall,
        risk_score: scores.risk,
        momentum_score: scores.momentum,
        trend_score: scores.trend,
        recommendations: vec![recommendation],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fixtures::{bars_from_closes, rising_closes};
    use crate::scoring::analyze_series;

    fn profile(risk_tolerance: RiskTolerance) -> UserProfile {
        UserProfile {
            risk_tolerance,
            ..UserProfile::default()
        }
    }

    fn scored_rising() -> (TechnicalSnapshot, ComponentScores) {
        let config = ScoringConfig::default();
        let bars = bars_from_closes(&rising_closes(100.0, 1.0, 30), 1_000.0);
        analyze_series(&bars, &config).unwrap()
    }

    #[test]
    fn test_rising_series_recommends_buying() {
        let config = ScoringConfig::default();
        let (snapshot, scores) = scored_rising();
        let rec = recommend(&snapshot, &scores, &profile(RiskTolerance::Moderate), &config);

        assert!(matches!(
            rec.action,
            TradeAction::Buy | TradeAction::StrongBuy
        ));
        assert!(!rec.reasoning.is_empty());
        assert!((0.0..=1.0).contains(&rec.confidence));
        assert!(rec.target_price > snapshot.current_price);
        assert!(rec.stop_loss < snapshot.current_price);
    }

    #[test]
    fn test_conservative_downgrade_on_high_risk() {
        let config = ScoringConfig::default();
        let (snapshot, mut scores) = scored_rising();
        scores.risk = 80.0;

        let rec = recommend(
            &snapshot,
            &scores,
            &profile(RiskTolerance::Conservative),
            &config,
        );
        assert_eq!(rec.action, TradeAction::Hold);
        assert!(rec.reasoning.contains("conservative"));

        // Same scores, moderate profile: the buy stands.
        let rec = recommend(&snapshot, &scores, &profile(RiskTolerance::Moderate), &config);
        assert!(is_buy_side(rec.action));
    }

    #[test]
    fn test_sell_side_bands_point_down() {
        let config = ScoringConfig::default();
        let closes: Vec<f64> = (0..30).map(|i| 200.0 - 2.0 * i as f64).collect();
        let bars = bars_from_closes(&closes, 1_000.0);
        let (snapshot, scores) = analyze_series(&bars, &config).unwrap();

        let rec = recommend(&snapshot, &scores, &profile(RiskTolerance::Moderate), &config);
        assert!(matches!(
            rec.action,
            TradeAction::Sell | TradeAction::StrongSell | TradeAction::Hold
        ));
        if matches!(rec.action, TradeAction::Sell | TradeAction::StrongSell) {
            assert!(rec.target_price < snapshot.current_price);
            assert!(rec.stop_loss > snapshot.current_price);
        }
    }

    #[test]
    fn test_confidence_is_distance_from_nearest_threshold() {
        let config = ScoringConfig::default();
        // Exactly on the buy threshold: zero confidence.
        assert_eq!(confidence_for_score(config.buy_threshold, &config), 0.0);
        // Mid-band between hold (45) and buy (65): saturated.
        assert_eq!(confidence_for_score(55.0, &config), 1.0);
        // 3 points above buy threshold.
        let c = confidence_for_score(config.buy_threshold + 3.0, &config);
        assert!((c - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_action_thresholds() {
        let config = ScoringConfig::default();
        assert_eq!(action_for_score(90.0, &config), TradeAction::StrongBuy);
        assert_eq!(action_for_score(70.0, &config), TradeAction::Buy);
        assert_eq!(action_for_score(50.0, &config), TradeAction::Hold);
        assert_eq!(action_for_score(30.0, &config), TradeAction::Sell);
        assert_eq!(action_for_score(10.0, &config), TradeAction::StrongSell);
    }
}
