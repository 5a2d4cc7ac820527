//! Volatility regime classification.

use super::{mean, true_ranges};
use crate::types::{Candle, VolatilityRegime};

/// Classifies realized volatility against its recent average.
pub struct RegimeClassifier {
    min_bars: usize,
    current_window: usize,
    average_window: usize,
}

impl Default for RegimeClassifier {
    fn default() -> Self {
        Self {
            min_bars: 20,
            current_window: 14,
            average_window: 20,
        }
    }
}

impl RegimeClassifier {
    pub fn classify(&self, candles: &[Candle]) -> VolatilityRegime {
        if candles.len() < self.min_bars {
            return VolatilityRegime::default();
        }

        let ranges = true_ranges(candles);
        let tail = |n: usize| &ranges[ranges.len().saturating_sub(n)..];

        let current_atr = mean(tail(self.current_window));
        let avg_atr20 = mean(tail(self.average_window));
        let ratio = if avg_atr20 > 0.0 {
            current_atr / avg_atr20
        } else {
            1.0
        };

        VolatilityRegime {
            current_atr,
            avg_atr20,
            ..VolatilityRegime::from_ratio(ratio)
        }
    }
}

/// Classify with the default windows.
pub fn classify_regime(candles: &[Candle]) -> VolatilityRegime {
    RegimeClassifier::default().classify(candles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::*;
    use crate::types::RegimeKind;

    /// Bars with constant range, then a final stretch with `late_range`.
    fn ranged_candles(count: usize, late: usize, range: f64, late_range: f64) -> Vec<Candle> {
        (0..count)
            .map(|i| {
                let r = if i >= count - late { late_range } else { range };
                Candle::new(i as i64 * 60_000, 100.0, 100.0 + r / 2.0, 100.0 - r / 2.0, 100.0, 10.0)
            })
            .collect()
    }

    #[test]
    fn test_short_series_is_normal() {
        let regime = classify_regime(&create_uptrend_candles(10));
        assert_eq!(regime.regime, RegimeKind::Normal);
        assert_eq!(regime.threshold_multiplier, 1.0);
    }

    #[test]
    fn test_constant_range_is_normal() {
        let regime = classify_regime(&ranged_candles(40, 0, 2.0, 2.0));
        assert!((regime.ratio - 1.0).abs() < 1e-12);
        assert_eq!(regime.regime, RegimeKind::Normal);
    }

    #[test]
    fn test_flat_series_ratio_defaults_to_one() {
        let regime = classify_regime(&create_flat_candles(30, 10.0));
        assert_eq!(regime.ratio, 1.0);
        assert_eq!(regime.regime, RegimeKind::Normal);
    }

    #[test]
    fn test_expanding_range_is_elevated() {
        // last 14 TRs = 6, previous 6 TRs = 1 -> current 6, avg 4.5 -> 1.33
        let regime = classify_regime(&ranged_candles(40, 14, 1.0, 6.0));
        assert_eq!(regime.current_atr, 6.0);
        assert_eq!(regime.regime, RegimeKind::High);
        assert_eq!(regime.threshold_multiplier, 1.5);
    }

    #[test]
    fn test_contracting_range_is_low() {
        // last 14 TRs = 1, previous 6 TRs = 10 -> avg 3.7 -> 0.27
        let regime = classify_regime(&ranged_candles(40, 14, 10.0, 1.0));
        assert_eq!(regime.regime, RegimeKind::Low);
        assert_eq!(regime.threshold_multiplier, 0.7);
    }
}
