use crate::types::{Candle, Timeframe};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Reference prices for the random walk (symbol -> USD).
pub const REFERENCE_PRICES: &[(&str, f64)] = &[
    ("btc", 65_000.0),
    ("eth", 3_500.0),
    ("bnb", 580.0),
    ("sol", 150.0),
    ("xrp", 0.55),
    ("doge", 0.15),
    ("ada", 0.45),
    ("avax", 35.0),
    ("dot", 7.0),
    ("link", 15.0),
    ("ltc", 80.0),
    ("atom", 9.0),
    ("uni", 8.0),
    ("near", 6.0),
    ("apt", 9.0),
];

const DEFAULT_REFERENCE: f64 = 100.0;
/// Maximum close-to-close move per bar.
const STEP: f64 = 0.01;

pub fn reference_price(symbol: &str) -> f64 {
    let symbol = symbol.to_lowercase();
    REFERENCE_PRICES
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, p)| *p)
        .unwrap_or(DEFAULT_REFERENCE)
}

fn symbol_seed(seed: u64, symbol: &str) -> u64 {
    symbol
        .to_lowercase()
        .bytes()
        .fold(seed, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
}

/// Seeded random walk ending at `end_ms`, oldest bar first.
///
/// The same seed, symbol and timeframe always yield the same prices.
pub fn generate(symbol: &str, timeframe: Timeframe, count: usize, seed: u64, end_ms: i64) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(symbol_seed(seed, symbol));
    let step_ms = timeframe.millis();
    let end = end_ms - end_ms.rem_euclid(step_ms);
    let start = end - step_ms * count.saturating_sub(1) as i64;

    let mut price = reference_price(symbol);
    (0..count)
        .map(|i| {
            let open = price;
            let close = (open * (1.0 + rng.gen_range(-STEP..=STEP))).max(f64::MIN_POSITIVE);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
            let volume = rng.gen_range(1_000.0..5_000.0);
            price = close;
            Candle::new(start + step_ms * i as i64, open, high, low, close, volume)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate("btc", Timeframe::OneHour, 50, 7, 1_700_000_000_000);
        let b = generate("BTC", Timeframe::OneHour, 50, 7, 1_700_000_000_000);
        assert_eq!(a, b);
        let c = generate("btc", Timeframe::OneHour, 50, 8, 1_700_000_000_000);
        assert_ne!(a, c);
    }

    #[test]
    fn test_generate_shape() {
        let candles = generate("eth", Timeframe::FiveMinutes, 100, 1, 1_700_000_123_456);
        assert_eq!(candles.len(), 100);
        assert_eq!(candles[0].open, 3_500.0);
        for pair in candles.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, 300_000);
            assert_eq!(pair[1].open, pair[0].close);
        }
        for c in &candles {
            assert!(c.high >= c.open.max(c.close));
            assert!(c.low <= c.open.min(c.close));
            assert!(c.close > 0.0);
        }
    }

    #[test]
    fn test_unknown_symbol_uses_default_reference() {
        assert_eq!(reference_price("pepe"), 100.0);
        assert!(generate("pepe", Timeframe::OneDay, 0, 1, 0).is_empty());
    }
}
