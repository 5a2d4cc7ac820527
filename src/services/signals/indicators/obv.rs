//! On-Balance Volume (OBV) indicator.

use crate::services::signals::{clamp_score, linear_slope, make_reading, mean, Signal};
use crate::types::{Candle, IndicatorReading, ObvValue, SignalCategory, Trend};

/// Window for the OBV trend slope.
pub const OBV_TREND_WINDOW: usize = 20;

/// Normalized slope beyond which the OBV trend is directional.
const TREND_THRESHOLD: f64 = 0.02;

/// Cumulative OBV at every index; starts at 0.
pub fn obv_series(candles: &[Candle]) -> Vec<f64> {
    let mut out = Vec::with_capacity(candles.len());
    let mut obv = 0.0;
    for (i, candle) in candles.iter().enumerate() {
        if i > 0 {
            let previous = candles[i - 1].close;
            if candle.close > previous {
                obv += candle.volume;
            } else if candle.close < previous {
                obv -= candle.volume;
            }
        }
        out.push(obv);
    }
    out
}

/// Trend of an OBV series over its last `window` values.
///
/// The least-squares slope is divided by the mean |OBV| of the window.
pub fn obv_trend(series: &[f64], window: usize) -> Trend {
    let recent = &series[series.len().saturating_sub(window)..];
    let scale = mean(&recent.iter().map(|v| v.abs()).collect::<Vec<_>>());
    if scale == 0.0 {
        return Trend::Neutral;
    }

    let normalized = linear_slope(recent) / scale;
    if normalized > TREND_THRESHOLD {
        Trend::Bullish
    } else if normalized < -TREND_THRESHOLD {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Latest OBV with its trend.
pub fn obv(candles: &[Candle]) -> ObvValue {
    let series = obv_series(candles);
    ObvValue {
        value: series.last().copied().unwrap_or(0.0),
        trend: obv_trend(&series, OBV_TREND_WINDOW),
    }
}

/// OBV (On-Balance Volume) indicator.
///
/// - If close > previous close: OBV += volume
/// - If close < previous close: OBV -= volume
///
/// Reading is driven by OBV change vs price change over the lookback,
/// with divergences scored stronger than confirmations.
pub struct Obv {
    lookback: usize,
}

impl Default for Obv {
    fn default() -> Self {
        Self { lookback: 14 }
    }
}

impl Signal for Obv {
    fn id(&self) -> &str {
        "obv"
    }

    fn name(&self) -> &str {
        "OBV"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Volume
    }

    fn min_periods(&self) -> usize {
        self.lookback + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods() {
            return None;
        }

        let series = obv_series(candles);
        let start = candles.len() - self.lookback;
        let obv_change = series[series.len() - 1] - series[start];
        let price_change = candles[candles.len() - 1].close - candles[start].close;

        let avg_volume = mean(&candles[start..].iter().map(|c| c.volume).collect::<Vec<_>>());
        let normalized = if avg_volume > 0.0 {
            obv_change / (avg_volume * self.lookback as f64)
        } else {
            0.0
        };

        let score = if obv_change > 0.0 && price_change > 0.0 {
            (normalized * 100.0).clamp(20.0, 80.0)
        } else if obv_change > 0.0 {
            (normalized * 150.0).clamp(50.0, 100.0)
        } else if obv_change < 0.0 && price_change < 0.0 {
            (normalized * 100.0).clamp(-80.0, -20.0)
        } else if obv_change < 0.0 {
            (normalized * 150.0).clamp(-100.0, -50.0)
        } else {
            0.0
        };

        Some(make_reading(
            self.name(),
            self.category(),
            series[series.len() - 1],
            clamp_score(score),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::*;

    #[test]
    fn test_obv_accumulates_signed_volume() {
        let candles = vec![
            Candle::new(0, 10.0, 10.0, 10.0, 10.0, 100.0),
            Candle::new(1, 10.0, 11.0, 10.0, 11.0, 50.0),
            Candle::new(2, 11.0, 11.0, 9.0, 9.0, 20.0),
            Candle::new(3, 9.0, 9.0, 9.0, 9.0, 70.0),
        ];
        assert_eq!(obv_series(&candles), vec![0.0, 50.0, 30.0, 30.0]);
    }

    #[test]
    fn test_obv_trend_bullish_in_uptrend() {
        let value = obv(&create_uptrend_candles(40));
        assert!(value.value > 0.0);
        assert_eq!(value.trend, Trend::Bullish);
    }

    #[test]
    fn test_obv_trend_bearish_in_downtrend() {
        let value = obv(&create_downtrend_candles(40));
        assert_eq!(value.trend, Trend::Bearish);
    }

    #[test]
    fn test_obv_trend_flat_is_neutral() {
        assert_eq!(obv(&create_flat_candles(40, 3.0)).trend, Trend::Neutral);
    }

    #[test]
    fn test_obv_empty() {
        assert_eq!(obv(&[]), ObvValue::default());
    }
}
