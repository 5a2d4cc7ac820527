use super::chart::{Candle, Timeframe};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of a piece of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Served by a live provider (possibly from a short-lived cache).
    Real,
    /// Generated locally because no provider could serve it.
    Synthetic,
}

impl DataSource {
    pub fn is_real(&self) -> bool {
        matches!(self, DataSource::Real)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Real => write!(f, "real"),
            DataSource::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// A value together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sourced<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Sourced<T> {
    pub fn real(value: T) -> Self {
        Self {
            value,
            source: DataSource::Real,
        }
    }

    pub fn synthetic(value: T) -> Self {
        Self {
            value,
            source: DataSource::Synthetic,
        }
    }
}

/// Candle series for one symbol/timeframe, tagged with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
    pub source: DataSource,
    /// Provider that served the data ("binance", "kraken", ... or "synthetic").
    pub provider: String,
    /// Whether the series was served from the cache.
    pub cached: bool,
    /// Unix timestamp (milliseconds) when fetched or generated.
    pub fetched_at: i64,
}

impl CandleSeries {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}
