//! Exponential Moving Average (EMA) indicator.

use crate::services::signals::{clamp_score, make_reading, Signal};
use crate::types::{closes, Candle, IndicatorReading, SignalCategory};

/// EMA of `values`, seeded with the SMA of the first `period` values.
///
/// Shorter than `period` returns the last value unchanged; empty returns 0.
pub fn ema(values: &[f64], period: usize) -> f64 {
    ema_series(values, period).last().copied().unwrap_or(0.0)
}

/// Prefix EMA: `series[i] == ema(&values[..=i], period)`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return values.to_vec();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut current = 0.0;

    for (i, &value) in values.iter().enumerate() {
        if i + 1 < period {
            out.push(value);
        } else if i + 1 == period {
            current = values[..period].iter().sum::<f64>() / period as f64;
            out.push(current);
        } else {
            current = (value - current) * multiplier + current;
            out.push(current);
        }
    }

    out
}

/// EMA (Exponential Moving Average) indicator.
///
/// Signal based on price position relative to the EMA:
/// - Price above EMA = bullish
/// - Price below EMA = bearish
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Signal for Ema {
    fn id(&self) -> &str {
        match self.period {
            20 => "ema20",
            50 => "ema50",
            200 => "ema200",
            _ => "ema",
        }
    }

    fn name(&self) -> &str {
        match self.period {
            20 => "EMA (20)",
            50 => "EMA (50)",
            200 => "EMA (200)",
            _ => "EMA",
        }
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods() {
            return None;
        }
        let value = ema(&closes(candles), self.period);
        let current_price = candles.last()?.close;
        if value == 0.0 {
            return None;
        }

        // 5% deviation = full signal
        let pct_diff = (current_price - value) / value * 100.0;
        let score = (pct_diff * 20.0).clamp(-100.0, 100.0);

        Some(make_reading(self.name(), self.category(), value, clamp_score(score)))
    }
}
