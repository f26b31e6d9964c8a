//! Technical indicator primitives
//!
//! Thin wrappers over the `ta` crate's stateful indicators plus the few
//! calculations it does not cover in the form the scoring engine needs:
//! RSI with Wilder smoothing (ta's RSI smooths with a standard EMA) and the
//! return/drawdown statistics shared with the portfolio engine.

use ta::{
    Next,
    indicators::{AverageTrueRange, BollingerBands, SimpleMovingAverage},
};

use crate::error::{AnalysisError, Result};
use crate::market::Bar;

/// Bollinger band snapshot: moving average ± k standard deviations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Simple moving average of the last `period` values
///
/// Requires at least `period` values.
pub fn sma(values: &[f64], period: usize) -> Result<f64> {
    if values.len() < period {
        return Err(AnalysisError::InsufficientData(format!(
            "SMA({period}) needs {period} values, got {}",
            values.len()
        )));
    }
    let mut indicator = SimpleMovingAverage::new(period)
        .map_err(|e| AnalysisError::Indicator(e.to_string()))?;
    let mut current = 0.0;
    for &value in values {
        current = indicator.next(value);
    }
    Ok(current)
}

/// RSI over `period` using Wilder smoothing of average gains/losses
///
/// Requires `period + 1` closes (one extra for the first delta). A series
/// with no movement at all reads as a neutral 50.
pub fn wilder_rsi(closes: &[f64], period: usize) -> Result<f64> {
    if closes.len() < period + 1 {
        return Err(AnalysisError::InsufficientData(format!(
            "RSI({period}) needs {} closes, got {}",
            period + 1,
            closes.len()
        )));
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for window in closes[..=period].windows(2) {
        let delta = window[1] - window[0];
        if delta > 0.0 {
            avg_gain += delta;
        } else {
            avg_loss -= delta;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    // Wilder smoothing: previous average carries weight (period - 1) / period.
    for window in closes[period..].windows(2) {
        let delta = window[1] - window[0];
        let (gain, loss) = if delta > 0.0 { (delta, 0.0) } else { (0.0, -delta) };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
    }

    if avg_loss == 0.0 && avg_gain == 0.0 {
        return Ok(50.0);
    }
    if avg_loss == 0.0 {
        return Ok(100.0);
    }
    let rs = avg_gain / avg_loss;
    Ok(100.0 - 100.0 / (1.0 + rs))
}

/// Bollinger bands over `period` at `k` standard deviations
pub fn bollinger(closes: &[f64], period: usize, k: f64) -> Result<Bands> {
    if closes.len() < period {
        return Err(AnalysisError::InsufficientData(format!(
            "Bollinger({period}) needs {period} closes, got {}",
            closes.len()
        )));
    }
    let mut indicator =
        BollingerBands::new(period, k).map_err(|e| AnalysisError::Indicator(e.to_string()))?;
    let mut bands = Bands {
        upper: 0.0,
        middle: 0.0,
        lower: 0.0,
    };
    for &close in closes {
        let output = indicator.next(close);
        bands = Bands {
            upper: output.upper,
            middle: output.average,
            lower: output.lower,
        };
    }
    Ok(bands)
}

/// Current volume relative to its trailing `period` average
///
/// A dead tape (zero trailing average) reads as 0.
pub fn volume_ratio(volumes: &[f64], period: usize) -> Result<f64> {
    if volumes.len() < period {
        return Err(AnalysisError::InsufficientData(format!(
            "volume ratio needs {period} values, got {}",
            volumes.len()
        )));
    }
    let current = volumes[volumes.len() - 1];
    let trailing = &volumes[volumes.len() - period..];
    let average = trailing.iter().sum::<f64>() / period as f64;
    if average <= f64::EPSILON {
        return Ok(0.0);
    }
    Ok(current / average)
}

/// Average true range over `period`, fed bar by bar
pub fn atr(bars: &[Bar], period: usize) -> Result<f64> {
    if bars.len() < period + 1 {
        return Err(AnalysisError::InsufficientData(format!(
            "ATR({period}) needs {} bars, got {}",
            period + 1,
            bars.len()
        )));
    }
    let mut indicator = AverageTrueRange::new(period)
        .map_err(|e| AnalysisError::Indicator(e.to_string()))?;
    let mut current = 0.0;
    for bar in bars {
        let item = ta::DataItem::builder()
            .open(bar.open)
            .high(bar.high)
            .low(bar.low)
            .close(bar.close)
            .volume(bar.volume)
            .build()
            .map_err(|e| AnalysisError::Indicator(e.to_string()))?;
        current = indicator.next(&item);
    }
    Ok(current)
}

/// Period-over-period fractional returns of a value series
///
/// Zero-valued predecessors are skipped rather than dividing by zero.
pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Sample standard deviation; 0 for fewer than two values
pub fn stddev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    variance.sqrt()
}

/// Largest peak-to-trough decline of a value series, as a fraction
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &value in values {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.max((peak - value) / peak);
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fixtures::bars_from_closes;

    #[test]
    fn test_sma_basic() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&values, 5).unwrap();
        assert!((result - 3.0).abs() < 1e-9);

        // Last 3 of the series
        let result = sma(&values, 3).unwrap();
        assert!((result - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_sma_insufficient() {
        assert!(matches!(
            sma(&[1.0, 2.0], 5),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_wilder_rsi_all_gains_saturates() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let rsi = wilder_rsi(&closes, 14).unwrap();
        assert!((rsi - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_wilder_rsi_flat_series_is_neutral() {
        let closes = vec![42.0; 20];
        let rsi = wilder_rsi(&closes, 14).unwrap();
        assert!((rsi - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_wilder_rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let rsi = wilder_rsi(&closes, 14).unwrap();
        assert!(rsi.abs() < 1e-9);
    }

    #[test]
    fn test_wilder_rsi_bounds() {
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let rsi = wilder_rsi(&closes, 14).unwrap();
        assert!(rsi > 0.0 && rsi < 100.0);
        // Mixed but net-positive series should read above neutral.
        assert!(rsi > 50.0);
    }

    #[test]
    fn test_bollinger_contains_sma_for_flat_series() {
        let closes = vec![50.0; 25];
        let bands = bollinger(&closes, 20, 2.0).unwrap();
        assert!((bands.middle - 50.0).abs() < 1e-9);
        assert!((bands.upper - 50.0).abs() < 1e-9);
        assert!((bands.lower - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_volume_ratio() {
        let mut volumes = vec![100.0; 19];
        volumes.push(200.0);
        let ratio = volume_ratio(&volumes, 20).unwrap();
        // Trailing average includes the spike itself: 105.
        assert!((ratio - 200.0 / 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_volume_ratio_zero_tape() {
        let volumes = vec![0.0; 20];
        assert_eq!(volume_ratio(&volumes, 20).unwrap(), 0.0);
    }

    #[test]
    fn test_atr_positive_for_moving_series() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let bars = bars_from_closes(&closes, 1_000.0);
        let atr = atr(&bars, 14).unwrap();
        assert!(atr > 0.0);
    }

    #[test]
    fn test_simple_returns() {
        let returns = simple_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.1).abs() < 1e-9);
        assert!((returns[1] + 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_stddev_edge_cases() {
        assert_eq!(stddev(&[]), 0.0);
        assert_eq!(stddev(&[1.0]), 0.0);
        assert!((stddev(&[1.0, 1.0, 1.0]) - 0.0).abs() < 1e-12);
        assert!((stddev(&[2.0, 4.0]) - std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_max_drawdown() {
        let values = [100.0, 120.0, 90.0, 110.0, 80.0];
        let dd = max_drawdown(&values);
        // Peak 120 to trough 80.
        assert!((dd - (120.0 - 80.0) / 120.0).abs() < 1e-9);

        assert_eq!(max_drawdown(&[100.0, 110.0, 120.0]), 0.0);
    }
}
