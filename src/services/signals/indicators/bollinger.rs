//! Bollinger Bands indicator.

use crate::services::signals::{clamp_score, make_reading, mean, Signal};
use crate::types::{closes, BollingerValue, Candle, IndicatorReading, SignalCategory};

/// Bands over the trailing `period` values (the whole series if shorter).
///
/// Uses the population standard deviation. Empty input gives all-zero bands.
pub fn bollinger(values: &[f64], period: usize, std_dev_multiplier: f64) -> BollingerValue {
    if values.is_empty() {
        return BollingerValue::default();
    }

    let start = values.len().saturating_sub(period.max(1));
    let window = &values[start..];
    let middle = mean(window);
    let variance = window.iter().map(|v| (v - middle).powi(2)).sum::<f64>() / window.len() as f64;
    let std_dev = variance.sqrt();

    BollingerValue {
        upper: middle + std_dev_multiplier * std_dev,
        middle,
        lower: middle - std_dev_multiplier * std_dev,
    }
}

/// Bollinger Bands indicator.
///
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// Price near the lower band reads bullish, near the upper band bearish.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn compute(&self, values: &[f64]) -> BollingerValue {
        bollinger(values, self.period, self.std_dev_multiplier)
    }
}

impl Signal for BollingerBands {
    fn id(&self) -> &str {
        "bollinger"
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Volatility
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.period {
            return None;
        }

        let bands = self.compute(&closes(candles));
        let percent_b = bands.percent_b(candles.last()?.close);

        let score = if percent_b <= 0.0 {
            100.0
        } else if percent_b >= 1.0 {
            -100.0
        } else {
            (0.5 - percent_b) * 200.0
        };

        Some(make_reading(
            self.name(),
            self.category(),
            percent_b * 100.0,
            clamp_score(score),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::*;

    #[test]
    fn test_bands_ordered() {
        let candles = create_uptrend_candles(50);
        let bands = BollingerBands::default().compute(&closes(&candles));
        assert!(bands.upper >= bands.middle);
        assert!(bands.middle >= bands.lower);
    }

    #[test]
    fn test_flat_series_collapses_bands() {
        let candles = create_flat_candles(30, 42.0);
        let bands = BollingerBands::default().compute(&closes(&candles));
        assert_eq!(bands.upper, 42.0);
        assert_eq!(bands.middle, 42.0);
        assert_eq!(bands.lower, 42.0);
    }

    #[test]
    fn test_population_std_dev() {
        // mean 5, population std dev 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bands = bollinger(&values, 8, 2.0);
        assert_eq!(bands.middle, 5.0);
        assert_eq!(bands.upper, 9.0);
        assert_eq!(bands.lower, 1.0);
    }

    #[test]
    fn test_short_series_uses_everything() {
        let bands = bollinger(&[1.0, 3.0], 20, 2.0);
        assert_eq!(bands.middle, 2.0);
    }

    #[test]
    fn test_empty_series() {
        assert_eq!(bollinger(&[], 20, 2.0), BollingerValue::default());
    }
}
