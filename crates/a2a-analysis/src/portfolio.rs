//! Portfolio metrics engine
//!
//! Computes risk and performance metrics for a set of positions plus cash,
//! from aligned daily close histories per ticker and an optional benchmark
//! series. All inputs arrive by value from the adapter; the engine holds no
//! state and performs no I/O.

use std::collections::{BTreeMap, HashMap};

use a2a_core::payload::{
    PerformanceMetrics, PortfolioData, PortfolioRecommendation, PortfolioResponse, PositionData,
    RiskMetrics,
};
use tracing::debug;

use crate::config::PortfolioConfig;
use crate::error::{AnalysisError, Result};
use crate::indicators::{max_drawdown, simple_returns, stddev};

/// Sector name used for the cash slice of the allocation map
pub const CASH_SECTOR: &str = "cash";

/// Goal tags that mark beta as required
const BETA_GOALS: [&str; 2] = ["beta", "risk_assessment"];

fn validate_inputs(
    data: &PortfolioData,
    history: &HashMap<String, Vec<f64>>,
) -> Result<usize> {
    if data.positions.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "portfolio has no positions".to_string(),
        ));
    }
    if data.cash < 0.0 {
        return Err(AnalysisError::InvalidInput(
            "cash balance must be non-negative".to_string(),
        ));
    }

    let mut series_len: Option<usize> = None;
    for position in &data.positions {
        if position.quantity <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "position {} has non-positive quantity",
                position.ticker
            )));
        }
        if position.average_price < 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "position {} has negative average price",
                position.ticker
            )));
        }
        let closes = history.get(&position.ticker).ok_or_else(|| {
            AnalysisError::InsufficientData(format!(
                "no price history for {}",
                position.ticker
            ))
        })?;
        if closes.len() < 2 {
            return Err(AnalysisError::InsufficientData(format!(
                "history for {} has {} closes, need at least 2",
                position.ticker,
                closes.len()
            )));
        }
        match series_len {
            None => series_len = Some(closes.len()),
            Some(len) if len != closes.len() => {
                return Err(AnalysisError::InvalidInput(format!(
                    "history for {} has {} closes, expected {len} to align with the rest",
                    position.ticker,
                    closes.len()
                )));
            }
            Some(_) => {}
        }
    }
    // Validation guarantees at least one position.
    Ok(series_len.unwrap_or(0))
}

/// Daily portfolio value series: sum of position values plus cash
fn value_series(
    data: &PortfolioData,
    history: &HashMap<String, Vec<f64>>,
    len: usize,
) -> Vec<f64> {
    (0..len)
        .map(|day| {
            data.positions
                .iter()
                .map(|p| p.quantity * history[&p.ticker][day])
                .sum::<f64>()
                + data.cash
        })
        .collect()
}

fn beta_against(
    portfolio_returns: &[f64],
    benchmark: Option<&[f64]>,
    requested: bool,
) -> Result<Option<f64>> {
    let Some(benchmark_closes) = benchmark else {
        if requested {
            return Err(AnalysisError::InsufficientData(
                "beta was requested but no benchmark series was provided".to_string(),
            ));
        }
        return Ok(None);
    };

    let benchmark_returns = simple_returns(benchmark_closes);
    if benchmark_returns.len() != portfolio_returns.len() {
        if requested {
            return Err(AnalysisError::InsufficientData(format!(
                "benchmark has {} returns, portfolio has {}",
                benchmark_returns.len(),
                portfolio_returns.len()
            )));
        }
        return Ok(None);
    }

    let n = benchmark_returns.len() as f64;
    let mean_p = portfolio_returns.iter().sum::<f64>() / n;
    let mean_b = benchmark_returns.iter().sum::<f64>() / n;
    let covariance = portfolio_returns
        .iter()
        .zip(&benchmark_returns)
        .map(|(p, b)| (p - mean_p) * (b - mean_b))
        .sum::<f64>()
        / n;
    let variance = benchmark_returns
        .iter()
        .map(|b| (b - mean_b).powi(2))
        .sum::<f64>()
        / n;

    if variance <= f64::EPSILON {
        if requested {
            return Err(AnalysisError::InsufficientData(
                "benchmark variance is zero, beta is undefined".to_string(),
            ));
        }
        return Ok(None);
    }
    Ok(Some(covariance / variance))
}

/// Market value per sector as percentages of total value, cash included
fn sector_allocation(
    positions: &[PositionData],
    history: &HashMap<String, Vec<f64>>,
    cash: f64,
    last_day: usize,
) -> BTreeMap<String, f64> {
    let mut by_sector: BTreeMap<String, f64> = BTreeMap::new();
    let mut total = cash;
    for position in positions {
        let value = position.quantity * history[&position.ticker][last_day];
        *by_sector.entry(position.sector.clone()).or_insert(0.0) += value;
        total += value;
    }
    if cash > 0.0 {
        by_sector.insert(CASH_SECTOR.to_string(), cash);
    }
    if total <= 0.0 {
        return BTreeMap::new();
    }
    by_sector
        .into_iter()
        .map(|(sector, value)| (sector, value / total * 100.0))
        .collect()
}

fn build_recommendations(
    allocation: &BTreeMap<String, f64>,
    losers: usize,
    total_positions: usize,
    config: &PortfolioConfig,
) -> Vec<PortfolioRecommendation> {
    let mut recommendations = Vec::new();

    // Concentration is judged on invested sectors, not the cash buffer.
    let over_concentrated = allocation
        .iter()
        .filter(|(sector, _)| sector.as_str() != CASH_SECTOR)
        .find(|(_, pct)| **pct > config.concentration_threshold_pct);
    if let Some((sector, pct)) = over_concentrated {
        recommendations.push(PortfolioRecommendation {
            action: "REBALANCE".to_string(),
            reasoning: format!(
                "Sector {sector} holds {pct:.1}% of portfolio value, above the {:.0}% \
                 concentration threshold; rebalance to reduce single-sector exposure.",
                config.concentration_threshold_pct
            ),
            confidence: 0.9,
        });
    }

    if total_positions > 0
        && losers as f64 / total_positions as f64 > config.loss_review_ratio
    {
        recommendations.push(PortfolioRecommendation {
            action: "REVIEW_LOSERS".to_string(),
            reasoning: format!(
                "{losers} of {total_positions} positions are under water; review stop-loss \
                 levels and position sizing."
            ),
            confidence: 0.7,
        });
    }

    if recommendations.is_empty() {
        recommendations.push(PortfolioRecommendation {
            action: "HOLD".to_string(),
            reasoning: "Allocation is within concentration limits and losses are contained; \
                        no rebalancing needed."
                .to_string(),
            confidence: 0.6,
        });
    }
    recommendations
}

/// Analyze a portfolio end to end
///
/// `history` maps each position ticker to its aligned daily close series;
/// `benchmark` is the benchmark close series when available. Beta is
/// required — and its absence an error — only when `analysis_goals` asks
/// for it.
pub fn analyze_portfolio(
    user_id: &str,
    data: &PortfolioData,
    history: &HashMap<String, Vec<f64>>,
    benchmark: Option<&[f64]>,
    analysis_goals: &[String],
    config: &PortfolioConfig,
) -> Result<PortfolioResponse> {
    let series_len = validate_inputs(data, history)?;
    let last_day = series_len - 1;

    let values = value_series(data, history, series_len);
    let returns = simple_returns(&values);

    let daily_volatility = stddev(&returns);
    let drawdown = max_drawdown(&values);
    let mean_daily = if returns.is_empty() {
        0.0
    } else {
        returns.iter().sum::<f64>() / returns.len() as f64
    };

    let annualized_vol = daily_volatility * config.trading_days.sqrt();
    let annualized_mean = mean_daily * config.trading_days;
    let sharpe_ratio = if annualized_vol <= f64::EPSILON {
        0.0
    } else {
        (annualized_mean - config.risk_free_rate) / annualized_vol
    };

    let beta_requested = analysis_goals
        .iter()
        .any(|goal| BETA_GOALS.contains(&goal.as_str()));
    let beta = beta_against(&returns, benchmark, beta_requested)?;

    // Unrealized P/L per position at the latest close.
    let mut invested = 0.0;
    let mut total_pnl = 0.0;
    let mut losers = 0;
    let mut winners = 0;
    for position in &data.positions {
        let pnl = position.quantity * (history[&position.ticker][last_day] - position.average_price);
        invested += position.quantity * position.average_price;
        total_pnl += pnl;
        if pnl > 0.0 {
            winners += 1;
        } else if pnl < 0.0 {
            losers += 1;
        }
    }
    let total_return = if invested > 0.0 {
        total_pnl / invested * 100.0
    } else {
        0.0
    };
    let win_rate = winners as f64 / data.positions.len() as f64 * 100.0;

    let allocation = sector_allocation(&data.positions, history, data.cash, last_day);
    let recommendations =
        build_recommendations(&allocation, losers, data.positions.len(), config);

    let concentration_penalty = if recommendations.iter().any(|r| r.action == "REBALANCE") {
        10.0
    } else {
        0.0
    };
    let overall_score = (50.0 + total_return.clamp(-25.0, 25.0) + (win_rate - 50.0) * 0.2
        - drawdown * 100.0 * 0.5
        - concentration_penalty)
        .clamp(0.0, 100.0);

    debug!(
        user_id = user_id,
        positions = data.positions.len(),
        overall_score = overall_score,
        drawdown = drawdown,
        "portfolio analyzed"
    );

    Ok(PortfolioResponse {
        user_id: user_id.to_string(),
        overall_score,
        risk_metrics: RiskMetrics {
            volatility: daily_volatility,
            max_drawdown: drawdown,
            sharpe_ratio,
            beta,
        },
        performance_metrics: PerformanceMetrics {
            total_return,
            annualized_return: annualized_mean * 100.0,
            win_rate,
        },
        recommendations,
        sector_allocation: allocation,
    })
}
