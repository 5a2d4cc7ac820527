//! Signal analysis module.
//!
//! Technical indicators, volatility regime classification, pattern detection
//! and confluence scoring over a candle series.

pub mod confluence;
pub mod indicators;
pub mod patterns;
pub mod regime;

pub use confluence::{score_confluence, score_direction};
pub use indicators::{all_indicators, compute_indicators, compute_readings};
pub use patterns::detect_patterns;
pub use regime::classify_regime;

use crate::types::{Candle, IndicatorReading, SignalCategory, SignalDirection};

/// Trait for implementing technical indicators.
pub trait Signal: Send + Sync {
    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Category this indicator belongs to.
    fn category(&self) -> SignalCategory;

    /// Minimum number of candles required for a reading.
    fn min_periods(&self) -> usize;

    /// Produce a normalized reading.
    /// Returns None if there are fewer than `min_periods` candles.
    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading>;
}

/// Helper to create an IndicatorReading.
pub fn make_reading(name: &str, category: SignalCategory, value: f64, score: i8) -> IndicatorReading {
    IndicatorReading {
        name: name.to_string(),
        category,
        value,
        score,
        direction: SignalDirection::from_score(score),
    }
}

/// Clamp a value to the -100..=100 score range.
pub fn clamp_score(value: f64) -> i8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(-100.0, 100.0) as i8
}

/// True ranges for consecutive bar pairs.
pub(crate) fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| w[1].true_range(&w[0]))
        .collect()
}

/// Arithmetic mean; 0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Least-squares slope of `values` against their index.
pub(crate) fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }

    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}
