//! Stochastic RSI indicator.

use super::rsi::rsi_series;
use crate::services::signals::{clamp_score, make_reading, Signal};
use crate::types::{closes, Candle, IndicatorReading, SignalCategory, StochRsiValue};

/// Stochastic of the RSI series.
///
/// %K is the position of each RSI within the min-max of its trailing
/// `stoch_period` RSI values (a flat window reads 50); %D is the mean of the
/// last `smooth` %K values. Only fully warmed RSI values take part, and fewer
/// than `stoch_period + smooth - 1` of them gives 50/50.
pub fn stoch_rsi(values: &[f64], rsi_period: usize, stoch_period: usize, smooth: usize) -> StochRsiValue {
    let series = rsi_series(values, rsi_period);
    let rsis = series.get(rsi_period..).unwrap_or(&[]);
    if stoch_period == 0 || smooth == 0 || rsis.len() < stoch_period + smooth - 1 {
        return StochRsiValue::default();
    }

    let k_values: Vec<f64> = (stoch_period - 1..rsis.len())
        .map(|i| {
            let window = &rsis[i + 1 - stoch_period..=i];
            let low = window.iter().copied().fold(f64::INFINITY, f64::min);
            let high = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if high > low {
                ((rsis[i] - low) / (high - low) * 100.0).clamp(0.0, 100.0)
            } else {
                50.0
            }
        })
        .collect();

    let k = k_values.last().copied().unwrap_or(50.0);
    let recent = &k_values[k_values.len().saturating_sub(smooth)..];
    let d = recent.iter().sum::<f64>() / recent.len() as f64;

    StochRsiValue { k, d }
}

/// Stochastic RSI (14, 3).
///
/// - %K below 20: Oversold (bullish)
/// - %K above 80: Overbought (bearish)
pub struct StochRsi {
    rsi_period: usize,
    stoch_period: usize,
    smooth: usize,
}

impl Default for StochRsi {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            stoch_period: 14,
            smooth: 3,
        }
    }
}

impl StochRsi {
    pub fn compute(&self, values: &[f64]) -> StochRsiValue {
        stoch_rsi(values, self.rsi_period, self.stoch_period, self.smooth)
    }
}

impl Signal for StochRsi {
    fn id(&self) -> &str {
        "stoch_rsi"
    }

    fn name(&self) -> &str {
        "Stochastic RSI"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.rsi_period + self.stoch_period + self.smooth
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods() {
            return None;
        }

        let k = self.compute(&closes(candles)).k;
        let score = if k <= 20.0 {
            (20.0 - k) / 20.0 * 100.0
        } else if k >= 80.0 {
            -(k - 80.0) / 20.0 * 100.0
        } else {
            (50.0 - k) / 30.0 * 50.0
        };

        Some(make_reading(self.name(), self.category(), k, clamp_score(score)))
    }
}
