//! Relative Strength Index (RSI) indicator.

use crate::services::signals::{clamp_score, make_reading, Signal};
use crate::types::{closes, Candle, IndicatorReading, SignalCategory};

/// Neutral RSI when there is not enough history.
pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI over the trailing `period` close changes.
///
/// Uses simple averages of gains and losses. Fewer than `period + 1` values
/// returns 50. A window with no losses (flat series included) returns 100.
pub fn rsi(values: &[f64], period: usize) -> f64 {
    if period == 0 || values.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let window = &values[values.len() - period - 1..];
    let (gains, losses) = window.windows(2).fold((0.0, 0.0), |(g, l), w| {
        let change = w[1] - w[0];
        if change > 0.0 {
            (g + change, l)
        } else {
            (g, l - change)
        }
    });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// RSI at every index, each computed over the prefix ending there.
pub fn rsi_series(values: &[f64], period: usize) -> Vec<f64> {
    (0..values.len()).map(|i| rsi(&values[..=i], period)).collect()
}

/// RSI (Relative Strength Index) indicator.
///
/// Values range from 0-100:
/// - Below 30: Oversold (potential buy signal)
/// - Above 70: Overbought (potential sell signal)
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Map an RSI value to a -100..100 score.
    pub fn score(rsi: f64) -> f64 {
        if rsi <= 30.0 {
            ((30.0 - rsi) / 30.0 * 100.0).min(100.0)
        } else if rsi >= 70.0 {
            -((rsi - 70.0) / 30.0 * 100.0).min(100.0)
        } else {
            (50.0 - rsi) / 20.0 * 50.0
        }
    }
}

impl Signal for Rsi {
    fn id(&self) -> &str {
        "rsi"
    }

    fn name(&self) -> &str {
        "RSI (14)"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods() {
            return None;
        }
        let value = rsi(&closes(candles), self.period);
        Some(make_reading(
            self.name(),
            self.category(),
            value,
            clamp_score(Self::score(value)),
        ))
    }
}
