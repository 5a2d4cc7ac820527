use super::analysis::{PatternMatch, VolatilityRegime};
use super::chart::Timeframe;
use super::ml::Prediction;
use super::quality::DataQuality;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Direction of a single indicator reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDirection {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl SignalDirection {
    /// Create direction from a score (-100 to +100).
    pub fn from_score(score: i8) -> Self {
        match score {
            s if s >= 60 => SignalDirection::StrongBuy,
            s if s >= 20 => SignalDirection::Buy,
            s if s > -20 => SignalDirection::Neutral,
            s if s > -60 => SignalDirection::Sell,
            _ => SignalDirection::StrongSell,
        }
    }
}

/// Category of a technical indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Trend,
    Momentum,
    Volatility,
    Volume,
}

/// Normalized reading from a single indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorReading {
    /// Indicator name (e.g., "RSI (14)", "MACD").
    pub name: String,
    pub category: SignalCategory,
    /// Raw indicator value.
    pub value: f64,
    /// Normalized score from -100 (strong sell) to +100 (strong buy).
    pub score: i8,
    pub direction: SignalDirection,
}

/// Bullish / bearish / neutral bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MacdValue {
    pub value: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerValue {
    /// %B: 0 at the lower band, 1 at the upper band. Collapsed bands give 0.5.
    pub fn percent_b(&self, price: f64) -> f64 {
        let width = self.upper - self.lower;
        if width > 0.0 {
            (price - self.lower) / width
        } else {
            0.5
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StochRsiValue {
    pub k: f64,
    pub d: f64,
}

impl Default for StochRsiValue {
    fn default() -> Self {
        Self { k: 50.0, d: 50.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObvValue {
    pub value: f64,
    pub trend: Trend,
}

/// Full indicator snapshot for a candle series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    pub rsi: f64,
    pub macd: MacdValue,
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub bollinger: BollingerValue,
    pub atr: f64,
    pub stoch_rsi: StochRsiValue,
    pub adx: f64,
    pub obv: ObvValue,
    pub vwap: f64,
    /// Last close.
    pub price: f64,
    /// Number of bars the snapshot was computed from.
    pub bars: usize,
}

impl IndicatorSet {
    /// EMAs with enough history to be meaningful, fastest first.
    fn warmed_emas(&self) -> Vec<f64> {
        [(20, self.ema20), (50, self.ema50), (200, self.ema200)]
            .into_iter()
            .filter(|(period, _)| self.bars >= *period)
            .map(|(_, value)| value)
            .collect()
    }

    /// Trend from the EMA stack.
    ///
    /// An EMA longer than the series equals the last close, so only warmed EMAs
    /// take part in the ordering check.
    pub fn trend(&self) -> Trend {
        let emas = self.warmed_emas();
        let Some(&fastest) = emas.first() else {
            return Trend::Neutral;
        };

        let descending = emas.windows(2).all(|w| w[0] > w[1]);
        let ascending = emas.windows(2).all(|w| w[0] < w[1]);

        if self.price > fastest && descending {
            Trend::Bullish
        } else if self.price < fastest && ascending {
            Trend::Bearish
        } else {
            Trend::Neutral
        }
    }
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Long,
    Short,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "long"),
            TradeDirection::Short => write!(f, "short"),
        }
    }
}

/// Confluence recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongEntry,
    Entry,
    Wait,
    Avoid,
}

impl Recommendation {
    pub fn from_score(score: f64, signal_count: usize) -> Self {
        if score >= 75.0 && signal_count >= 5 {
            Recommendation::StrongEntry
        } else if score >= 60.0 && signal_count >= 4 {
            Recommendation::Entry
        } else if score >= 40.0 && signal_count >= 3 {
            Recommendation::Wait
        } else {
            Recommendation::Avoid
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongEntry => "Strong Entry",
            Recommendation::Entry => "Entry",
            Recommendation::Wait => "Wait",
            Recommendation::Avoid => "Avoid",
        }
    }
}

/// A triggered confluence rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfluenceSignal {
    pub indicator: String,
    pub reason: String,
    pub weight: f64,
}

/// Confluence outcome for one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfluenceResult {
    pub direction: TradeDirection,
    /// 0-100.
    pub score: f64,
    pub signals: Vec<ConfluenceSignal>,
    pub recommendation: Recommendation,
}

/// Final trust-scored trading signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingSignal {
    pub id: Uuid,
    pub symbol: String,
    pub exchange: String,
    pub timeframe: Timeframe,
    pub direction: TradeDirection,
    pub entry: f64,
    pub stop_loss: f64,
    pub targets: Vec<f64>,
    /// Reward to first target divided by risk to stop.
    pub risk_reward: f64,
    pub indicators: IndicatorSet,
    pub readings: Vec<IndicatorReading>,
    pub regime: VolatilityRegime,
    pub patterns: Vec<PatternMatch>,
    pub confluence: ConfluenceResult,
    pub prediction: Prediction,
    pub data_quality: DataQuality,
    /// Combined confidence (0-100) after data-quality adjustment.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Unix timestamp (milliseconds) when generated.
    pub timestamp: i64,
}
