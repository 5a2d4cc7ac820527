//! Rule-based candlestick and chart pattern detection.

use crate::types::{Candle, PatternKind, PatternMatch};

/// Detects patterns over the most recent candles.
pub struct PatternDetector {
    /// Candles considered for chart patterns.
    lookback: usize,
    /// Minimum bar distance between the two peaks of a double top/bottom.
    min_peak_distance: usize,
    /// Maximum relative gap between the two peaks.
    peak_tolerance: f64,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self {
            lookback: 20,
            min_peak_distance: 3,
            peak_tolerance: 0.02,
        }
    }
}

impl PatternDetector {
    /// All patterns present at the end of the series.
    ///
    /// `multiplier` is the volatility threshold multiplier applied to expected moves.
    pub fn detect(&self, candles: &[Candle], multiplier: f64, timeframe: &str) -> Vec<PatternMatch> {
        let start = candles.len().saturating_sub(self.lookback);
        let window = &candles[start..];

        let mut kinds = Vec::new();
        kinds.extend(self.double_top(window));
        kinds.extend(self.double_bottom(window));
        kinds.extend(engulfing(window));
        kinds.extend(star(window));
        kinds.extend(hammer_or_star(window));
        kinds.extend(three_in_a_row(window));

        kinds
            .into_iter()
            .map(|kind| PatternMatch::new(kind, multiplier, timeframe))
            .collect()
    }

    fn double_top(&self, window: &[Candle]) -> Option<PatternKind> {
        let highs: Vec<f64> = window.iter().map(|c| c.high).collect();
        let (first, second) = self.twin_extremes(&highs, |a, b| a > b)?;

        let last = window.last()?;
        let previous = window.get(window.len().checked_sub(2)?)?;
        let confirmed = last.close < highs[first].min(highs[second]) && last.close < previous.close;
        confirmed.then_some(PatternKind::DoubleTop)
    }

    fn double_bottom(&self, window: &[Candle]) -> Option<PatternKind> {
        let lows: Vec<f64> = window.iter().map(|c| c.low).collect();
        let (first, second) = self.twin_extremes(&lows, |a, b| a < b)?;

        let last = window.last()?;
        let previous = window.get(window.len().checked_sub(2)?)?;
        let confirmed = last.close > lows[first].max(lows[second]) && last.close > previous.close;
        confirmed.then_some(PatternKind::DoubleBottom)
    }

    /// Index of the window's extreme value and of a second local extreme at
    /// least `min_peak_distance` bars away within `peak_tolerance` of it.
    ///
    /// `better(a, b)` is true when `a` is more extreme than `b`.
    fn twin_extremes(&self, values: &[f64], better: impl Fn(f64, f64) -> bool) -> Option<(usize, usize)> {
        if values.len() < self.min_peak_distance + 2 {
            return None;
        }

        let mut first = 0;
        for (i, &v) in values.iter().enumerate() {
            if better(v, values[first]) {
                first = i;
            }
        }
        let peak = values[first];
        if peak == 0.0 {
            return None;
        }

        let is_local = |i: usize| {
            let left = i == 0 || !better(values[i - 1], values[i]);
            let right = i + 1 == values.len() || !better(values[i + 1], values[i]);
            left && right
        };

        let mut second: Option<usize> = None;
        for (j, &v) in values.iter().enumerate() {
            if j.abs_diff(first) < self.min_peak_distance || !is_local(j) {
                continue;
            }
            if ((peak - v) / peak).abs() > self.peak_tolerance {
                continue;
            }
            if second.map_or(true, |s| better(v, values[s])) {
                second = Some(j);
            }
        }

        second.map(|s| (first, s))
    }
}

fn engulfing(window: &[Candle]) -> Option<PatternKind> {
    let [prev, cur] = last_n::<2>(window)?;

    if prev.is_bearish() && cur.is_bullish() && cur.open <= prev.close && cur.close >= prev.open {
        return Some(PatternKind::BullishEngulfing);
    }
    if prev.is_bullish() && cur.is_bearish() && cur.open >= prev.close && cur.close <= prev.open {
        return Some(PatternKind::BearishEngulfing);
    }
    None
}

fn star(window: &[Candle]) -> Option<PatternKind> {
    let [first, middle, last] = last_n::<3>(window)?;

    let strong = first.range() > 0.0 && first.body() >= first.range() * 0.5;
    let small_middle = middle.range() > 0.0 && middle.body() < middle.range() * 0.1;
    if !strong || !small_middle {
        return None;
    }

    let midpoint = (first.open + first.close) / 2.0;
    if first.is_bearish() && last.is_bullish() && last.close > midpoint {
        return Some(PatternKind::MorningStar);
    }
    if first.is_bullish() && last.is_bearish() && last.close < midpoint {
        return Some(PatternKind::EveningStar);
    }
    None
}

fn hammer_or_star(window: &[Candle]) -> Option<PatternKind> {
    let last = window.last()?;
    let body = last.body();
    if body <= 0.0 {
        return None;
    }

    if last.lower_wick() >= body * 2.0 && last.upper_wick() < body * 0.5 {
        return Some(PatternKind::Hammer);
    }
    if last.upper_wick() >= body * 2.0 && last.lower_wick() < body * 0.5 {
        return Some(PatternKind::ShootingStar);
    }
    None
}

fn three_in_a_row(window: &[Candle]) -> Option<PatternKind> {
    let [a, b, c] = last_n::<3>(window)?;

    let rising = a.open < b.open && b.open < c.open && a.close < b.close && b.close < c.close;
    let falling = a.open > b.open && b.open > c.open && a.close > b.close && b.close > c.close;

    if a.is_bullish() && b.is_bullish() && c.is_bullish() && rising {
        return Some(PatternKind::ThreeWhiteSoldiers);
    }
    if a.is_bearish() && b.is_bearish() && c.is_bearish() && falling {
        return Some(PatternKind::ThreeBlackCrows);
    }
    None
}

fn last_n<const N: usize>(window: &[Candle]) -> Option<[Candle; N]> {
    let start = window.len().checked_sub(N)?;
    window[start..].try_into().ok()
}

/// Detect with the default lookback.
pub fn detect_patterns(candles: &[Candle], multiplier: f64, timeframe: &str) -> Vec<PatternMatch> {
    PatternDetector::default().detect(candles, multiplier, timeframe)
}
