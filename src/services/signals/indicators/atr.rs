//! Average True Range (ATR) indicator.

use crate::services::signals::{clamp_score, make_reading, mean, true_ranges, Signal};
use crate::types::{Candle, IndicatorReading, SignalCategory};

/// Wilder-smoothed ATR.
///
/// Seeded with the mean of the first `period` true ranges. With fewer true
/// ranges than `period` the mean of what is available is returned; fewer than
/// two candles gives 0.
pub fn atr(candles: &[Candle], period: usize) -> f64 {
    let ranges = true_ranges(candles);
    if ranges.is_empty() {
        return 0.0;
    }
    if period == 0 || ranges.len() < period {
        return mean(&ranges);
    }

    let mut value = mean(&ranges[..period]);
    for tr in &ranges[period..] {
        value = (value * (period - 1) as f64 + tr) / period as f64;
    }
    value
}

/// ATR (Average True Range) indicator.
///
/// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|)
///
/// The reading compares current ATR to the longer-term average true range:
/// expanding volatility reads slightly bearish, contraction slightly bullish.
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn compute(&self, candles: &[Candle]) -> f64 {
        atr(candles, self.period)
    }
}

impl Signal for Atr {
    fn id(&self) -> &str {
        "atr"
    }

    fn name(&self) -> &str {
        "ATR (14)"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Volatility
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods() {
            return None;
        }

        let value = self.compute(candles);
        let current_price = candles.last()?.close;
        let atr_pct = value / current_price * 100.0;

        let ranges = true_ranges(candles);
        let lookback = (self.period * 2).min(ranges.len());
        let avg_tr = mean(&ranges[ranges.len() - lookback..]);

        let relative_vol = if avg_tr > 0.0 {
            (value / avg_tr - 1.0) * 100.0
        } else {
            0.0
        };
        let score = -relative_vol.clamp(-50.0, 50.0);

        Some(make_reading(self.name(), self.category(), atr_pct, clamp_score(score)))
    }
}
