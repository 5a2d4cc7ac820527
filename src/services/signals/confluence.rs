//! Confluence scoring.
//!
//! A fixed, direction-specific rule table is evaluated against an indicator
//! snapshot. The score is the triggered weight over the total possible weight.

use super::mean;
use crate::types::{
    Candle, ConfluenceResult, ConfluenceSignal, IndicatorSet, Recommendation, TradeDirection, Trend,
};

/// Bars averaged for the volume-surge baseline.
const VOLUME_BASELINE: usize = 20;
const VOLUME_SURGE_FACTOR: f64 = 1.5;

struct Rule {
    indicator: &'static str,
    weight: f64,
    check: fn(&IndicatorSet, &[Candle], TradeDirection) -> Option<String>,
}

const RULES: [Rule; 8] = [
    Rule {
        indicator: "RSI",
        weight: 15.0,
        check: rsi_zone,
    },
    Rule {
        indicator: "MACD",
        weight: 15.0,
        check: macd_cross,
    },
    Rule {
        indicator: "EMA",
        weight: 15.0,
        check: ema_stack,
    },
    Rule {
        indicator: "Bollinger",
        weight: 10.0,
        check: bollinger_position,
    },
    Rule {
        indicator: "StochRSI",
        weight: 10.0,
        check: stoch_extreme,
    },
    Rule {
        indicator: "ADX",
        weight: 10.0,
        check: adx_strength,
    },
    Rule {
        indicator: "OBV",
        weight: 10.0,
        check: obv_trend,
    },
    Rule {
        indicator: "Volume",
        weight: 15.0,
        check: volume_surge,
    },
];

fn rsi_zone(ind: &IndicatorSet, _: &[Candle], dir: TradeDirection) -> Option<String> {
    let rsi = ind.rsi;
    match dir {
        TradeDirection::Long if rsi <= 35.0 => Some(format!("RSI oversold at {:.1}", rsi)),
        TradeDirection::Long if rsi > 50.0 && rsi < 70.0 => Some(format!("RSI bullish momentum at {:.1}", rsi)),
        TradeDirection::Short if rsi >= 65.0 => Some(format!("RSI overbought at {:.1}", rsi)),
        TradeDirection::Short if rsi > 30.0 && rsi < 50.0 => Some(format!("RSI bearish momentum at {:.1}", rsi)),
        _ => None,
    }
}

fn macd_cross(ind: &IndicatorSet, _: &[Candle], dir: TradeDirection) -> Option<String> {
    let h = ind.macd.histogram;
    match dir {
        TradeDirection::Long if h > 0.0 => Some("MACD above signal line".to_string()),
        TradeDirection::Short if h < 0.0 => Some("MACD below signal line".to_string()),
        _ => None,
    }
}

fn ema_stack(ind: &IndicatorSet, _: &[Candle], dir: TradeDirection) -> Option<String> {
    match (dir, ind.trend()) {
        (TradeDirection::Long, Trend::Bullish) => Some("Price above rising EMA stack".to_string()),
        (TradeDirection::Short, Trend::Bearish) => Some("Price below falling EMA stack".to_string()),
        _ => None,
    }
}

fn bollinger_position(ind: &IndicatorSet, _: &[Candle], dir: TradeDirection) -> Option<String> {
    let width = ind.bollinger.upper - ind.bollinger.lower;
    if width <= 0.0 {
        return None;
    }
    let position = ind.bollinger.percent_b(ind.price);
    match dir {
        TradeDirection::Long if position <= 0.2 => Some("Price near lower Bollinger band".to_string()),
        TradeDirection::Short if position >= 0.8 => Some("Price near upper Bollinger band".to_string()),
        _ => None,
    }
}

fn stoch_extreme(ind: &IndicatorSet, _: &[Candle], dir: TradeDirection) -> Option<String> {
    let k = ind.stoch_rsi.k;
    match dir {
        TradeDirection::Long if k < 20.0 => Some(format!("StochRSI oversold at {:.1}", k)),
        TradeDirection::Short if k > 80.0 => Some(format!("StochRSI overbought at {:.1}", k)),
        _ => None,
    }
}

fn adx_strength(ind: &IndicatorSet, _: &[Candle], _: TradeDirection) -> Option<String> {
    (ind.adx >= 25.0).then(|| format!("Trending market, ADX {:.1}", ind.adx))
}

fn obv_trend(ind: &IndicatorSet, _: &[Candle], dir: TradeDirection) -> Option<String> {
    match (dir, ind.obv.trend) {
        (TradeDirection::Long, Trend::Bullish) => Some("OBV accumulating".to_string()),
        (TradeDirection::Short, Trend::Bearish) => Some("OBV distributing".to_string()),
        _ => None,
    }
}

fn volume_surge(_: &IndicatorSet, candles: &[Candle], dir: TradeDirection) -> Option<String> {
    let (last, prior) = candles.split_last()?;
    let baseline = &prior[prior.len().saturating_sub(VOLUME_BASELINE)..];
    let avg = mean(&baseline.iter().map(|c| c.volume).collect::<Vec<_>>());
    if avg <= 0.0 || last.volume <= avg * VOLUME_SURGE_FACTOR {
        return None;
    }

    let ratio = last.volume / avg;
    match dir {
        TradeDirection::Long if last.is_bullish() => Some(format!("Volume surge {:.1}x on bullish bar", ratio)),
        TradeDirection::Short if last.is_bearish() => Some(format!("Volume surge {:.1}x on bearish bar", ratio)),
        _ => None,
    }
}

/// Total weight of every rule.
pub fn max_weight() -> f64 {
    RULES.iter().map(|r| r.weight).sum()
}

/// Score one direction.
pub fn score_direction(ind: &IndicatorSet, candles: &[Candle], direction: TradeDirection) -> ConfluenceResult {
    let signals: Vec<ConfluenceSignal> = RULES
        .iter()
        .filter_map(|rule| {
            (rule.check)(ind, candles, direction).map(|reason| ConfluenceSignal {
                indicator: rule.indicator.to_string(),
                reason,
                weight: rule.weight,
            })
        })
        .collect();

    let triggered: f64 = signals.iter().map(|s| s.weight).sum();
    let possible = max_weight();
    let score = if possible > 0.0 {
        (triggered * 100.0 / possible).clamp(0.0, 100.0)
    } else {
        0.0
    };

    ConfluenceResult {
        direction,
        score,
        recommendation: Recommendation::from_score(score, signals.len()),
        signals,
    }
}

/// Score both directions and keep the stronger one. Ties go long.
pub fn score_confluence(ind: &IndicatorSet, candles: &[Candle]) -> ConfluenceResult {
    let long = score_direction(ind, candles, TradeDirection::Long);
    let short = score_direction(ind, candles, TradeDirection::Short);
    if short.score > long.score {
        short
    } else {
        long
    }
}
