//! Property tests for the indicator, regime, pattern and confluence math

use haunt_signals::services::signals::indicators::{adx, bollinger, ema, rsi, stoch_rsi};
use haunt_signals::services::signals::{
    classify_regime, compute_indicators, detect_patterns, score_confluence, score_direction,
};
use haunt_signals::*;

/// Deterministic zig-zag walk with a slow drift.
fn choppy(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let swing = if i % 3 == 0 { -2.5 } else { 1.5 };
            let base = 100.0 + (i as f64 * 0.7).sin() * 5.0 + swing;
            let open = base - swing * 0.4;
            Candle::new(
                i as i64 * 60_000,
                open,
                open.max(base) + 0.8,
                open.min(base) - 0.6,
                base,
                1_000.0 + (i % 7) as f64 * 150.0,
            )
        })
        .collect()
}

fn rising(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = 100.0 + i as f64;
            Candle::new(i as i64 * 60_000, close - 0.5, close + 0.5, close - 1.0, close, 1_000.0)
        })
        .collect()
}

#[test]
fn test_oscillators_stay_in_range() {
    for count in [1, 5, 15, 29, 31, 60, 200] {
        let candles = choppy(count);
        let values = closes(&candles);

        let r = rsi::rsi(&values, 14);
        assert!((0.0..=100.0).contains(&r), "rsi {} at {} bars", r, count);

        let s = stoch_rsi::stoch_rsi(&values, 14, 14, 3);
        assert!((0.0..=100.0).contains(&s.k));
        assert!((0.0..=100.0).contains(&s.d));

        let a = adx::adx(&candles, 14);
        assert!((0.0..=100.0).contains(&a));

        let b = bollinger::bollinger(&values, 20, 2.0);
        assert!(b.upper >= b.middle && b.middle >= b.lower);
    }
}

#[test]
fn test_ema_shorter_than_period_is_last_value() {
    let values = [3.0, 7.5, 4.25];
    assert_eq!(ema::ema(&values, 20), 4.25);
    assert_eq!(ema::ema(&[], 20), 0.0);
}

#[test]
fn test_flat_series_rsi_is_100() {
    assert_eq!(rsi::rsi(&[50.0; 30], 14), 100.0);
}

#[test]
fn test_short_series_gets_neutral_defaults() {
    let set = compute_indicators(&rising(2));
    assert_eq!(set.rsi, 50.0);
    assert_eq!(set.adx, 25.0);
    assert_eq!(set.stoch_rsi.k, 50.0);
    assert_eq!(set.stoch_rsi.d, 50.0);
    assert_eq!(set.price, 101.0);
}

#[test]
fn test_stoch_rsi_neutral_until_rsi_warms_up() {
    let set = compute_indicators(&rising(20));
    assert_eq!(set.stoch_rsi.k, 50.0);
    assert_eq!(set.stoch_rsi.d, 50.0);
}

#[test]
fn test_rising_series_snapshot() {
    let set = compute_indicators(&rising(30));
    assert_eq!(set.rsi, 100.0);
    assert!(set.macd.histogram > 0.0);
    assert_eq!(set.trend(), Trend::Bullish);
}

#[test]
fn test_regime_from_ratio() {
    assert_eq!(VolatilityRegime::from_ratio(0.5).regime, RegimeKind::Low);
    assert_eq!(VolatilityRegime::from_ratio(1.0).regime, RegimeKind::Normal);
    assert_eq!(VolatilityRegime::from_ratio(1.5).regime, RegimeKind::High);
    assert_eq!(VolatilityRegime::from_ratio(2.5).regime, RegimeKind::Extreme);
    assert_eq!(VolatilityRegime::from_ratio(2.5).threshold_multiplier, 2.0);
}

#[test]
fn test_regime_needs_twenty_bars() {
    let regime = classify_regime(&choppy(19));
    assert_eq!(regime.regime, RegimeKind::Normal);
    assert_eq!(regime.threshold_multiplier, 1.0);
}

#[test]
fn test_pattern_moves_scale_with_multiplier() {
    let candles = choppy(40);
    let base = detect_patterns(&candles, 1.0, "1m");
    let scaled = detect_patterns(&candles, 2.0, "1m");
    assert_eq!(base.len(), scaled.len());
    for (a, b) in base.iter().zip(&scaled) {
        assert_eq!(a.pattern, b.pattern);
        assert!((b.expected_move - a.expected_move * 2.0).abs() < 1e-9);
        assert_eq!(a.confidence, a.pattern.base_confidence());
    }
}

#[test]
fn test_confluence_bounded_and_best_side_wins() {
    for candles in [choppy(60), rising(60)] {
        let set = compute_indicators(&candles);
        let long = score_direction(&set, &candles, TradeDirection::Long);
        let short = score_direction(&set, &candles, TradeDirection::Short);
        let best = score_confluence(&set, &candles);

        for result in [&long, &short, &best] {
            assert!((0.0..=100.0).contains(&result.score));
        }
        assert_eq!(best.score, long.score.max(short.score));
    }
}
