//! Volume Weighted Average Price (VWAP) indicator.

use crate::services::signals::{clamp_score, make_reading, Signal};
use crate::types::{Candle, IndicatorReading, SignalCategory};

/// VWAP over the whole supplied series, with no session reset.
///
/// Zero total volume falls back to the last close; empty input gives 0.
pub fn vwap(candles: &[Candle]) -> f64 {
    let (tp_vol, vol) = candles.iter().fold((0.0, 0.0), |(tv, v), c| {
        (tv + c.typical_price() * c.volume, v + c.volume)
    });

    if vol > 0.0 {
        tp_vol / vol
    } else {
        candles.last().map(|c| c.close).unwrap_or(0.0)
    }
}

/// VWAP (Volume Weighted Average Price) indicator.
///
/// - Price above VWAP = bullish
/// - Price below VWAP = bearish
pub struct Vwap {
    min_periods: usize,
}

impl Default for Vwap {
    fn default() -> Self {
        Self { min_periods: 20 }
    }
}

impl Signal for Vwap {
    fn id(&self) -> &str {
        "vwap"
    }

    fn name(&self) -> &str {
        "VWAP"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Volume
    }

    fn min_periods(&self) -> usize {
        self.min_periods
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods {
            return None;
        }

        let value = vwap(candles);
        let current_price = candles.last()?.close;
        if value <= 0.0 {
            return None;
        }

        // 3% deviation = full signal
        let pct_diff = (current_price - value) / value * 100.0;
        let score = (pct_diff * 33.0).clamp(-100.0, 100.0);

        Some(make_reading(self.name(), self.category(), value, clamp_score(score)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::*;

    #[test]
    fn test_vwap_weights_by_volume() {
        let candles = vec![
            Candle::new(0, 10.0, 10.0, 10.0, 10.0, 1.0),
            Candle::new(1, 20.0, 20.0, 20.0, 20.0, 3.0),
        ];
        assert_eq!(vwap(&candles), 17.5);
    }

    #[test]
    fn test_vwap_zero_volume_uses_last_close() {
        let candles = vec![
            Candle::new(0, 10.0, 12.0, 9.0, 11.0, 0.0),
            Candle::new(1, 11.0, 13.0, 10.0, 12.0, 0.0),
        ];
        assert_eq!(vwap(&candles), 12.0);
    }

    #[test]
    fn test_vwap_empty() {
        assert_eq!(vwap(&[]), 0.0);
    }

    #[test]
    fn test_vwap_reading_bullish_above() {
        let reading = Vwap::default().calculate(&create_uptrend_candles(40)).unwrap();
        assert!(reading.score > 0);
    }
}
