use super::source::{DataSource, Sourced};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of numeric features in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 7;

/// Fixed-dimension summary of market and agent state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    /// Absolute price change, percent. [0, 100]
    pub price_volatility: f64,
    /// TVL change, percent. [-100, 100]
    pub tvl_change: f64,
    /// Gas price. [0, 1000]
    pub gas_price: f64,
    /// Share of positive credit deltas, percent. [0, 100]
    pub agent_performance: f64,
    /// [0, 100]
    pub market_sentiment: f64,
    /// [0, 100]
    pub liquidity_depth: f64,
    /// Volume change, percent. [-100, 500]
    pub volume_change: f64,
    /// Unix timestamp (milliseconds).
    pub timestamp: i64,
}

impl FeatureVector {
    /// Neutral vector used for empty clusters and default centroids.
    pub fn neutral() -> Self {
        Self {
            price_volatility: 0.0,
            tvl_change: 0.0,
            gas_price: 50.0,
            agent_performance: 50.0,
            market_sentiment: 50.0,
            liquidity_depth: 50.0,
            volume_change: 0.0,
            timestamp: 0,
        }
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.price_volatility,
            self.tvl_change,
            self.gas_price,
            self.agent_performance,
            self.market_sentiment,
            self.liquidity_depth,
            self.volume_change,
        ]
    }

    pub fn from_array(values: [f64; FEATURE_COUNT], timestamp: i64) -> Self {
        Self {
            price_volatility: values[0],
            tvl_change: values[1],
            gas_price: values[2],
            agent_performance: values[3],
            market_sentiment: values[4],
            liquidity_depth: values[5],
            volume_change: values[6],
            timestamp,
        }
    }

    /// Clamp every feature to its domain. Non-finite values become the neutral value.
    pub fn clamped(self) -> Self {
        let neutral = Self::neutral();
        let fix = |v: f64, fallback: f64, lo: f64, hi: f64| {
            if v.is_finite() {
                v.clamp(lo, hi)
            } else {
                fallback
            }
        };
        Self {
            price_volatility: fix(self.price_volatility, neutral.price_volatility, 0.0, 100.0),
            tvl_change: fix(self.tvl_change, neutral.tvl_change, -100.0, 100.0),
            gas_price: fix(self.gas_price, neutral.gas_price, 0.0, 1000.0),
            agent_performance: fix(self.agent_performance, neutral.agent_performance, 0.0, 100.0),
            market_sentiment: fix(self.market_sentiment, neutral.market_sentiment, 0.0, 100.0),
            liquidity_depth: fix(self.liquidity_depth, neutral.liquidity_depth, 0.0, 100.0),
            volume_change: fix(self.volume_change, neutral.volume_change, -100.0, 500.0),
            timestamp: self.timestamp,
        }
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Post-hoc label of a market cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterLabel {
    Bullish,
    Bearish,
    Sideways,
    Volatile,
    Stable,
}

impl ClusterLabel {
    pub const ALL: [ClusterLabel; 5] = [
        ClusterLabel::Bullish,
        ClusterLabel::Bearish,
        ClusterLabel::Sideways,
        ClusterLabel::Volatile,
        ClusterLabel::Stable,
    ];

    /// Label a centroid from its own values.
    pub fn from_centroid(c: &FeatureVector) -> Self {
        if c.price_volatility > 10.0 {
            ClusterLabel::Volatile
        } else if c.tvl_change > 5.0 && c.market_sentiment > 60.0 {
            ClusterLabel::Bullish
        } else if c.tvl_change < -5.0 && c.market_sentiment < 40.0 {
            ClusterLabel::Bearish
        } else if c.tvl_change.abs() < 2.0 && c.volume_change.abs() < 5.0 {
            ClusterLabel::Stable
        } else {
            ClusterLabel::Sideways
        }
    }

    /// Score bonus applied through the cluster-bonus weight.
    pub fn bonus(&self) -> f64 {
        match self {
            ClusterLabel::Bullish => 0.15,
            ClusterLabel::Stable => 0.10,
            ClusterLabel::Sideways => 0.0,
            ClusterLabel::Volatile => -0.10,
            ClusterLabel::Bearish => -0.15,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClusterLabel::Bullish => "bullish",
            ClusterLabel::Bearish => "bearish",
            ClusterLabel::Sideways => "sideways",
            ClusterLabel::Volatile => "volatile",
            ClusterLabel::Stable => "stable",
        }
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One k-means cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCluster {
    pub id: String,
    pub centroid: FeatureVector,
    /// Indices into the clustered dataset.
    pub members: Vec<usize>,
    pub label: ClusterLabel,
    /// 0-100.
    pub confidence: f64,
}

/// Linear model weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelWeights {
    pub price_volatility: f64,
    pub tvl_change: f64,
    pub gas_price: f64,
    pub agent_performance: f64,
    pub market_sentiment: f64,
    pub liquidity_depth: f64,
    pub volume_change: f64,
    pub cluster_bonus: f64,
}

impl Default for ModelWeights {
    fn default() -> Self {
        Self {
            price_volatility: -0.10,
            tvl_change: 0.20,
            gas_price: -0.10,
            agent_performance: 0.15,
            market_sentiment: 0.15,
            liquidity_depth: 0.10,
            volume_change: 0.10,
            cluster_bonus: 0.10,
        }
    }
}

impl ModelWeights {
    /// The seven feature weights, in [`FeatureVector::to_array`] order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.price_volatility,
            self.tvl_change,
            self.gas_price,
            self.agent_performance,
            self.market_sentiment,
            self.liquidity_depth,
            self.volume_change,
        ]
    }

    pub fn set_features(&mut self, w: [f64; FEATURE_COUNT]) {
        self.price_volatility = w[0];
        self.tvl_change = w[1];
        self.gas_price = w[2];
        self.agent_performance = w[3];
        self.market_sentiment = w[4];
        self.liquidity_depth = w[5];
        self.volume_change = w[6];
    }

    /// Sum of absolute values over all eight weights.
    pub fn abs_sum(&self) -> f64 {
        self.features().iter().map(|w| w.abs()).sum::<f64>() + self.cluster_bonus.abs()
    }

    /// Rescale so the absolute weights sum to 1. All-zero weights are left alone.
    pub fn normalize(&mut self) {
        let total = self.abs_sum();
        if total <= f64::EPSILON || !total.is_finite() {
            return;
        }
        let mut w = self.features();
        for v in w.iter_mut() {
            *v /= total;
        }
        self.set_features(w);
        self.cluster_bonus /= total;
    }
}

/// Classification metrics over recent training points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Points the metrics were computed over.
    pub samples: usize,
    pub trained_at: Option<DateTime<Utc>>,
}

/// Opportunity prediction for one feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// 0-100.
    pub score: f64,
    pub cluster_id: Option<String>,
    pub cluster_label: ClusterLabel,
    /// Confidence of the matched cluster, 0-100.
    pub confidence: f64,
    /// Percent.
    pub expected_return: f64,
    /// 0-100.
    pub risk_adjusted_score: f64,
    pub features: FeatureVector,
}

/// Training label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

/// Feature vector with its observed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledOutcome {
    pub features: FeatureVector,
    pub outcome: Outcome,
}

impl LabeledOutcome {
    pub fn new(features: FeatureVector, outcome: Outcome) -> Self {
        Self { features, outcome }
    }
}

/// Recent agent memory entry used for the sentiment feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub success: bool,
    pub high_risk: bool,
}

/// Raw market and agent context for feature extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContext {
    pub price: Option<f64>,
    pub previous_price: Option<f64>,
    pub tvl: Option<f64>,
    pub previous_tvl: Option<f64>,
    pub volume: Option<f64>,
    pub previous_volume: Option<f64>,
    pub gas_price: Option<f64>,
    /// Agent credit deltas, oldest first.
    #[serde(default)]
    pub credit_deltas: Vec<f64>,
    /// Agent memory, oldest first.
    #[serde(default)]
    pub memory: Vec<MemoryEntry>,
    pub funding_rate: Option<Sourced<f64>>,
    /// Provenance of the sentiment inputs.
    pub sentiment_source: DataSource,
    /// Provenance of the price/TVL/gas/agent inputs.
    pub source: DataSource,
}

impl Default for MarketContext {
    fn default() -> Self {
        Self {
            price: None,
            previous_price: None,
            tvl: None,
            previous_tvl: None,
            volume: None,
            previous_volume: None,
            gas_price: None,
            credit_deltas: Vec::new(),
            memory: Vec::new(),
            funding_rate: None,
            sentiment_source: DataSource::Synthetic,
            source: DataSource::Synthetic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_bounds_every_feature() {
        let v = FeatureVector::from_array([250.0, -300.0, 5000.0, 120.0, -5.0, f64::NAN, 900.0], 1).clamped();
        assert_eq!(v.price_volatility, 100.0);
        assert_eq!(v.tvl_change, -100.0);
        assert_eq!(v.gas_price, 1000.0);
        assert_eq!(v.agent_performance, 100.0);
        assert_eq!(v.market_sentiment, 0.0);
        assert_eq!(v.liquidity_depth, 50.0);
        assert_eq!(v.volume_change, 500.0);
    }

    #[test]
    fn test_label_rules() {
        let mut c = FeatureVector::neutral();
        assert_eq!(ClusterLabel::from_centroid(&c), ClusterLabel::Stable);

        c.price_volatility = 12.0;
        assert_eq!(ClusterLabel::from_centroid(&c), ClusterLabel::Volatile);

        c.price_volatility = 1.0;
        c.tvl_change = 8.0;
        c.market_sentiment = 70.0;
        assert_eq!(ClusterLabel::from_centroid(&c), ClusterLabel::Bullish);

        c.tvl_change = -8.0;
        c.market_sentiment = 30.0;
        assert_eq!(ClusterLabel::from_centroid(&c), ClusterLabel::Bearish);

        c.market_sentiment = 50.0;
        assert_eq!(ClusterLabel::from_centroid(&c), ClusterLabel::Sideways);
    }

    #[test]
    fn test_weights_normalize() {
        let mut w = ModelWeights::default();
        w.tvl_change = 3.0;
        w.normalize();
        assert!((w.abs_sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_weights_already_unit() {
        assert!((ModelWeights::default().abs_sum() - 1.0).abs() < 1e-9);
    }
}
