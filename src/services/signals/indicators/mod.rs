//! Technical indicator implementations.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod stoch_rsi;
pub mod vwap;

pub use adx::Adx;
pub use atr::Atr;
pub use bollinger::BollingerBands;
pub use ema::Ema;
pub use macd::Macd;
pub use obv::Obv;
pub use rsi::Rsi;
pub use stoch_rsi::StochRsi;
pub use vwap::Vwap;

use super::Signal;
use crate::types::{closes, Candle, IndicatorReading, IndicatorSet};

/// Get all available indicators.
pub fn all_indicators() -> Vec<Box<dyn Signal>> {
    vec![
        // Trend indicators
        Box::new(Ema::new(20)),
        Box::new(Ema::new(50)),
        Box::new(Ema::new(200)),
        Box::new(Macd::default()),
        Box::new(Adx::default()),
        // Momentum indicators
        Box::new(Rsi::default()),
        Box::new(StochRsi::default()),
        // Volatility indicators
        Box::new(BollingerBands::default()),
        Box::new(Atr::default()),
        // Volume indicators
        Box::new(Obv::default()),
        Box::new(Vwap::default()),
    ]
}

/// Readings from every indicator with enough history.
pub fn compute_readings(candles: &[Candle]) -> Vec<IndicatorReading> {
    all_indicators()
        .iter()
        .filter_map(|indicator| indicator.calculate(candles))
        .collect()
}

/// Full indicator snapshot. Short series get neutral defaults per indicator.
pub fn compute_indicators(candles: &[Candle]) -> IndicatorSet {
    let values = closes(candles);

    IndicatorSet {
        rsi: rsi::rsi(&values, 14),
        macd: Macd::default().compute(&values),
        ema20: ema::ema(&values, 20),
        ema50: ema::ema(&values, 50),
        ema200: ema::ema(&values, 200),
        bollinger: BollingerBands::default().compute(&values),
        atr: atr::atr(candles, 14),
        stoch_rsi: StochRsi::default().compute(&values),
        adx: adx::adx(candles, 14),
        obv: obv::obv(candles),
        vwap: vwap::vwap(candles),
        price: values.last().copied().unwrap_or(0.0),
        bars: candles.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::*;
    use crate::types::Trend;

    #[test]
    fn test_all_indicators_unique_ids() {
        let indicators = all_indicators();
        let mut ids: Vec<&str> = indicators.iter().map(|i| i.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), indicators.len());
    }

    #[test]
    fn test_linear_series_snapshot() {
        let set = compute_indicators(&create_linear_candles(30));
        assert_eq!(set.rsi, 100.0);
        assert!(set.macd.histogram > 0.0);
        assert_eq!(set.trend(), Trend::Bullish);
        assert_eq!(set.ema50, 129.0);
        assert_eq!(set.adx, 25.0);
        assert_eq!(set.bars, 30);
    }

    #[test]
    fn test_single_candle_defaults() {
        let set = compute_indicators(&create_flat_candles(1, 7.0));
        assert_eq!(set.rsi, 50.0);
        assert_eq!(set.atr, 0.0);
        assert_eq!(set.adx, 25.0);
        assert_eq!(set.stoch_rsi.k, 50.0);
        assert_eq!(set.vwap, 7.0);
        assert_eq!(set.price, 7.0);
    }

    #[test]
    fn test_readings_skip_short_history() {
        let readings = compute_readings(&create_uptrend_candles(25));
        assert!(readings.iter().any(|r| r.name == "RSI (14)"));
        assert!(!readings.iter().any(|r| r.name == "MACD"));
        assert!(!readings.iter().any(|r| r.name == "EMA (200)"));
    }
}
