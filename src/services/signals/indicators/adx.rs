//! Average Directional Index (ADX) indicator.

use crate::services::signals::{clamp_score, make_reading, true_ranges, Signal};
use crate::types::{Candle, IndicatorReading, SignalCategory};

/// Neutral ADX when there is not enough history.
pub const NEUTRAL_ADX: f64 = 25.0;

/// ADX with its directional indicators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdxValue {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// Wilder smoothing seeded with the mean of the first `period` values.
fn wilders_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(values.len() - period + 1);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    result.push(current);

    for value in &values[period..] {
        current = (current * (period - 1) as f64 + value) / period as f64;
        result.push(current);
    }

    result
}

/// Full ADX computation. Fewer than `2 * period + 1` candles gives ADX 25
/// with zero directional indicators.
pub fn adx_components(candles: &[Candle], period: usize) -> AdxValue {
    let neutral = AdxValue {
        adx: NEUTRAL_ADX,
        plus_di: 0.0,
        minus_di: 0.0,
    };
    if period == 0 || candles.len() < period * 2 + 1 {
        return neutral;
    }

    let (plus_dm, minus_dm): (Vec<f64>, Vec<f64>) = candles
        .windows(2)
        .map(|w| {
            let up_move = w[1].high - w[0].high;
            let down_move = w[0].low - w[1].low;
            let plus = if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 };
            let minus = if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 };
            (plus, minus)
        })
        .unzip();
    let tr = true_ranges(candles);

    let smoothed_plus = wilders_smooth(&plus_dm, period);
    let smoothed_minus = wilders_smooth(&minus_dm, period);
    let smoothed_tr = wilders_smooth(&tr, period);

    let di = |dm: f64, atr: f64| if atr > 0.0 { dm / atr * 100.0 } else { 0.0 };

    let dx_values: Vec<f64> = smoothed_tr
        .iter()
        .zip(smoothed_plus.iter().zip(&smoothed_minus))
        .map(|(&atr, (&p, &m))| {
            let plus_di = di(p, atr);
            let minus_di = di(m, atr);
            let sum = plus_di + minus_di;
            if sum > 0.0 {
                (plus_di - minus_di).abs() / sum * 100.0
            } else {
                0.0
            }
        })
        .collect();

    let Some(adx) = wilders_smooth(&dx_values, period).last().copied() else {
        return neutral;
    };

    let last_atr = smoothed_tr.last().copied().unwrap_or(0.0);
    AdxValue {
        adx: adx.clamp(0.0, 100.0),
        plus_di: di(smoothed_plus.last().copied().unwrap_or(0.0), last_atr),
        minus_di: di(smoothed_minus.last().copied().unwrap_or(0.0), last_atr),
    }
}

/// ADX value in [0, 100].
pub fn adx(candles: &[Candle], period: usize) -> f64 {
    adx_components(candles, period).adx
}

/// ADX (Average Directional Index) indicator.
///
/// Measures trend strength (not direction):
/// - Below 20: Weak trend / ranging market
/// - 20-40: Trending
/// - Above 40: Strong trend
///
/// The reading takes its sign from +DI vs -DI.
pub struct Adx {
    period: usize,
}

impl Default for Adx {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Signal for Adx {
    fn id(&self) -> &str {
        "adx"
    }

    fn name(&self) -> &str {
        "ADX (14)"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.period * 2 + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods() {
            return None;
        }

        let value = adx_components(candles, self.period);
        let trend_strength = (value.adx / 50.0).min(1.0);
        let direction = if value.plus_di > value.minus_di { 1.0 } else { -1.0 };

        let score = if value.adx < 20.0 {
            0.0
        } else {
            direction * trend_strength * 100.0
        };

        Some(make_reading(self.name(), self.category(), value.adx, clamp_score(score)))
    }
}
