//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::{ema, ema_series};
use crate::services::signals::{clamp_score, make_reading, Signal};
use crate::types::{closes, Candle, IndicatorReading, MacdValue, SignalCategory};

/// MACD over the full series.
///
/// The line at each index is the fast prefix-EMA minus the slow prefix-EMA;
/// the signal is the EMA of that line series.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdValue {
    if values.is_empty() {
        return MacdValue::default();
    }

    let line: Vec<f64> = ema_series(values, fast)
        .iter()
        .zip(ema_series(values, slow))
        .map(|(f, s)| f - s)
        .collect();

    let value = line.last().copied().unwrap_or(0.0);
    let signal_value = ema(&line, signal);

    MacdValue {
        value,
        signal: signal_value,
        histogram: value - signal_value,
    }
}

/// MACD indicator.
///
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn compute(&self, values: &[f64]) -> MacdValue {
        macd(values, self.fast_period, self.slow_period, self.signal_period)
    }
}

impl Signal for Macd {
    fn id(&self) -> &str {
        "macd"
    }

    fn name(&self) -> &str {
        "MACD"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.slow_period + self.signal_period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods() {
            return None;
        }

        let values = closes(candles);
        let current = self.compute(&values);
        let previous = self.compute(&values[..values.len() - 1]);

        // Growing histogram strengthens the signal
        let momentum = if current.histogram >= previous.histogram { 1.0 } else { 0.5 };

        let current_price = candles.last()?.close;
        let normalized = current.histogram / current_price * 10_000.0;
        let score = (normalized * momentum).clamp(-100.0, 100.0);

        Some(make_reading(
            self.name(),
            self.category(),
            current.histogram,
            clamp_score(score),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::*;

    #[test]
    fn test_macd_empty_is_default() {
        assert_eq!(macd(&[], 12, 26, 9), MacdValue::default());
    }

    #[test]
    fn test_macd_histogram_is_line_minus_signal() {
        let candles = create_uptrend_candles(80);
        let value = Macd::default().compute(&closes(&candles));
        assert!((value.histogram - (value.value - value.signal)).abs() < 1e-12);
    }

    #[test]
    fn test_macd_linear_trend_positive_histogram() {
        let candles = create_linear_candles(30);
        let value = Macd::default().compute(&closes(&candles));
        assert!((value.value - 7.0).abs() < 1e-9);
        assert!(value.histogram > 0.0);
    }

    #[test]
    fn test_macd_downtrend_negative_line() {
        let candles = create_downtrend_candles(80);
        let value = Macd::default().compute(&closes(&candles));
        assert!(value.value < 0.0);
    }

    #[test]
    fn test_macd_reading_requires_history() {
        let macd = Macd::default();
        assert_eq!(macd.min_periods(), 35);
        assert!(macd.calculate(&create_uptrend_candles(20)).is_none());
        assert!(macd.calculate(&create_uptrend_candles(60)).is_some());
    }
}
