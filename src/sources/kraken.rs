use super::{check_status, http_client, lookup_pair, parse_row, CandleSource};
use crate::error::{EngineError, Result};
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const KRAKEN_API_URL: &str = "https://api.kraken.com/0/public";

/// Symbol mapping for Kraken (symbol -> Kraken trading pair).
pub const SYMBOL_PAIRS: &[(&str, &str)] = &[
    ("btc", "XXBTZUSD"),
    ("eth", "XETHZUSD"),
    ("sol", "SOLUSD"),
    ("xrp", "XXRPZUSD"),
    ("doge", "XDGUSD"),
    ("ada", "ADAUSD"),
    ("avax", "AVAXUSD"),
    ("dot", "DOTUSD"),
    ("link", "LINKUSD"),
    ("ltc", "XLTCZUSD"),
    ("atom", "ATOMUSD"),
    ("uni", "UNIUSD"),
    ("near", "NEARUSD"),
    ("apt", "APTUSD"),
];

/// Kraken OHLC response.
#[derive(Debug, Deserialize)]
struct KrakenResponse {
    error: Vec<String>,
    result: Option<HashMap<String, Value>>,
}

/// Interval in minutes.
fn interval(timeframe: Timeframe) -> i64 {
    timeframe.seconds() / 60
}

/// Extract candles from an OHLC response.
///
/// Rows are `[time(s), open, high, low, close, vwap, volume, count]`; the
/// result map also carries a `last` cursor that is skipped.
fn parse_ohlc(response: KrakenResponse) -> Result<Vec<Candle>> {
    if !response.error.is_empty() {
        return Err(EngineError::source("kraken", response.error.join(", ")));
    }

    let result = response
        .result
        .ok_or_else(|| EngineError::source("kraken", "missing result"))?;

    let rows = result
        .iter()
        .filter(|(key, _)| key.as_str() != "last")
        .find_map(|(_, value)| value.as_array())
        .ok_or_else(|| EngineError::source("kraken", "missing OHLC rows"))?;

    Ok(rows
        .iter()
        .filter_map(|row| row.as_array().and_then(|r| parse_row(r, 1000, 6)))
        .collect())
}

/// Kraken public OHLC client.
#[derive(Clone)]
pub struct KrakenClient {
    client: Client,
}

impl KrakenClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl CandleSource for KrakenClient {
    fn name(&self) -> &str {
        "kraken"
    }

    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>> {
        let pair = lookup_pair(SYMBOL_PAIRS, self.name(), symbol)?;
        let url = format!("{}/OHLC?pair={}&interval={}", KRAKEN_API_URL, pair, interval(timeframe));

        let response = check_status(self.name(), self.client.get(&url).send().await?).await?;
        let data: KrakenResponse = response.json().await?;
        let mut candles = parse_ohlc(data)?;

        // Kraken ignores a limit and returns up to 720 bars
        if candles.len() > limit {
            candles.sort_by_key(|c| c.timestamp);
            candles.drain(..candles.len() - limit);
        }
        debug!("Kraken returned {} candles for {} {}", candles.len(), pair, timeframe);
        Ok(candles)
    }
}
