use super::source::DataSource;
use serde::{Deserialize, Serialize};

/// Modules that contribute a provenance tag to a signal.
pub const QUALITY_MODULES: [&str; 6] = [
    "candles",
    "indicators",
    "patterns",
    "funding_rate",
    "sentiment",
    "market_context",
];

/// Overall data-quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallQuality {
    High,
    Medium,
    Low,
}

impl OverallQuality {
    /// Bucket a 0-100 quality score. Boundaries are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 67.0 {
            OverallQuality::High
        } else if score >= 33.0 {
            OverallQuality::Medium
        } else {
            OverallQuality::Low
        }
    }
}

/// Provenance of one module's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleTag {
    pub module: String,
    pub source: DataSource,
}

/// Provenance roll-up for a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub modules: Vec<ModuleTag>,
    pub real_data_count: usize,
    pub total_modules: usize,
    /// real / total × 100, rounded to two decimals.
    pub quality_score: f64,
    pub overall_quality: OverallQuality,
}

impl DataQuality {
    pub fn is_fully_real(&self) -> bool {
        self.total_modules > 0 && self.real_data_count == self.total_modules
    }

    /// Modules that ran on synthetic inputs.
    pub fn synthetic_modules(&self) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|t| !t.source.is_real())
            .map(|t| t.module.as_str())
            .collect()
    }
}

/// What to do with signals backed by synthetic data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyntheticDataPolicy {
    /// Reject a signal when its candles are synthetic.
    #[default]
    Strict,
    /// Emit the signal with confidence scaled by quality and warnings attached.
    Advisory,
}

impl SyntheticDataPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Some(SyntheticDataPolicy::Strict),
            "advisory" => Some(SyntheticDataPolicy::Advisory),
            _ => None,
        }
    }
}
