use serde::{Deserialize, Serialize};
use std::fmt;

/// Realized volatility bucket relative to its recent average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegimeKind {
    Low,
    #[default]
    Normal,
    High,
    Extreme,
}

impl RegimeKind {
    /// Bucket an ATR ratio.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.7 {
            RegimeKind::Low
        } else if ratio < 1.2 {
            RegimeKind::Normal
        } else if ratio < 1.8 {
            RegimeKind::High
        } else {
            RegimeKind::Extreme
        }
    }

    /// Scale applied to expected moves and stop/target distances.
    pub fn threshold_multiplier(&self) -> f64 {
        match self {
            RegimeKind::Low => 0.7,
            RegimeKind::Normal => 1.0,
            RegimeKind::High => 1.5,
            RegimeKind::Extreme => 2.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RegimeKind::Low => "low",
            RegimeKind::Normal => "normal",
            RegimeKind::High => "high",
            RegimeKind::Extreme => "extreme",
        }
    }
}

impl fmt::Display for RegimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Volatility regime derived from ATR ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityRegime {
    pub current_atr: f64,
    pub avg_atr20: f64,
    pub ratio: f64,
    pub regime: RegimeKind,
    pub threshold_multiplier: f64,
}

impl VolatilityRegime {
    /// Regime for a given ratio; the ATR fields are left at zero.
    pub fn from_ratio(ratio: f64) -> Self {
        let regime = RegimeKind::from_ratio(ratio);
        Self {
            current_atr: 0.0,
            avg_atr20: 0.0,
            ratio,
            regime,
            threshold_multiplier: regime.threshold_multiplier(),
        }
    }
}

impl Default for VolatilityRegime {
    fn default() -> Self {
        Self::from_ratio(1.0)
    }
}

/// Bullish or bearish bias of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternBias {
    Bullish,
    Bearish,
}

/// Recognized candlestick and chart patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    DoubleTop,
    DoubleBottom,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
    Hammer,
    ShootingStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

impl PatternKind {
    pub fn id(&self) -> &'static str {
        match self {
            PatternKind::DoubleTop => "double_top",
            PatternKind::DoubleBottom => "double_bottom",
            PatternKind::BullishEngulfing => "bullish_engulfing",
            PatternKind::BearishEngulfing => "bearish_engulfing",
            PatternKind::MorningStar => "morning_star",
            PatternKind::EveningStar => "evening_star",
            PatternKind::Hammer => "hammer",
            PatternKind::ShootingStar => "shooting_star",
            PatternKind::ThreeWhiteSoldiers => "three_white_soldiers",
            PatternKind::ThreeBlackCrows => "three_black_crows",
        }
    }

    pub fn bias(&self) -> PatternBias {
        match self {
            PatternKind::DoubleBottom
            | PatternKind::BullishEngulfing
            | PatternKind::MorningStar
            | PatternKind::Hammer
            | PatternKind::ThreeWhiteSoldiers => PatternBias::Bullish,
            PatternKind::DoubleTop
            | PatternKind::BearishEngulfing
            | PatternKind::EveningStar
            | PatternKind::ShootingStar
            | PatternKind::ThreeBlackCrows => PatternBias::Bearish,
        }
    }

    /// Fixed confidence for this pattern type (0-100).
    pub fn base_confidence(&self) -> f64 {
        match self {
            PatternKind::DoubleTop | PatternKind::DoubleBottom => 70.0,
            PatternKind::BullishEngulfing | PatternKind::BearishEngulfing => 65.0,
            PatternKind::MorningStar | PatternKind::EveningStar => 75.0,
            PatternKind::Hammer | PatternKind::ShootingStar => 60.0,
            PatternKind::ThreeWhiteSoldiers | PatternKind::ThreeBlackCrows => 70.0,
        }
    }

    /// Expected move in percent before volatility scaling.
    pub fn base_move_pct(&self) -> f64 {
        match self {
            PatternKind::DoubleTop | PatternKind::DoubleBottom => 5.0,
            PatternKind::BullishEngulfing | PatternKind::BearishEngulfing => 3.0,
            PatternKind::MorningStar | PatternKind::EveningStar => 4.0,
            PatternKind::Hammer | PatternKind::ShootingStar => 2.5,
            PatternKind::ThreeWhiteSoldiers | PatternKind::ThreeBlackCrows => 4.0,
        }
    }
}

/// A detected pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    pub pattern: PatternKind,
    pub direction: PatternBias,
    /// 0-100, fixed per pattern type.
    pub confidence: f64,
    /// Percent, scaled by the volatility multiplier.
    pub expected_move: f64,
    pub timeframe: String,
}

impl PatternMatch {
    pub fn new(pattern: PatternKind, multiplier: f64, timeframe: &str) -> Self {
        Self {
            pattern,
            direction: pattern.bias(),
            confidence: pattern.base_confidence(),
            expected_move: pattern.base_move_pct() * multiplier,
            timeframe: timeframe.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regime_buckets() {
        assert_eq!(RegimeKind::from_ratio(0.5), RegimeKind::Low);
        assert_eq!(RegimeKind::from_ratio(1.0), RegimeKind::Normal);
        assert_eq!(RegimeKind::from_ratio(1.5), RegimeKind::High);
        assert_eq!(RegimeKind::from_ratio(2.5), RegimeKind::Extreme);
    }

    #[test]
    fn test_regime_bucket_edges() {
        assert_eq!(RegimeKind::from_ratio(0.7), RegimeKind::Normal);
        assert_eq!(RegimeKind::from_ratio(1.2), RegimeKind::High);
        assert_eq!(RegimeKind::from_ratio(1.8), RegimeKind::Extreme);
    }

    #[test]
    fn test_pattern_match_scales_move() {
        let m = PatternMatch::new(PatternKind::Hammer, 2.0, "1h");
        assert_eq!(m.expected_move, 5.0);
        assert_eq!(m.confidence, 60.0);
        assert_eq!(m.direction, PatternBias::Bullish);
    }
}
