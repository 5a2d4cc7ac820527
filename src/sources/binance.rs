use super::{check_status, http_client, lookup_pair, parse_row, CandleSource};
use crate::error::Result;
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";
const MAX_LIMIT: usize = 1000;

/// Symbol mapping for Binance (symbol -> Binance trading pair).
pub const SYMBOL_PAIRS: &[(&str, &str)] = &[
    ("btc", "BTCUSDT"),
    ("eth", "ETHUSDT"),
    ("bnb", "BNBUSDT"),
    ("sol", "SOLUSDT"),
    ("xrp", "XRPUSDT"),
    ("doge", "DOGEUSDT"),
    ("ada", "ADAUSDT"),
    ("avax", "AVAXUSDT"),
    ("dot", "DOTUSDT"),
    ("link", "LINKUSDT"),
    ("ltc", "LTCUSDT"),
    ("atom", "ATOMUSDT"),
    ("uni", "UNIUSDT"),
    ("near", "NEARUSDT"),
    ("apt", "APTUSDT"),
];

fn interval(timeframe: Timeframe) -> &'static str {
    timeframe.as_str()
}

/// Parse `/klines` rows: `[openTime, open, high, low, close, volume, ...]`, times in ms.
pub(crate) fn parse_klines(rows: &[Vec<Value>]) -> Vec<Candle> {
    rows.iter().filter_map(|row| parse_row(row, 1, 5)).collect()
}

/// Binance public klines client.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
}

impl BinanceClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl CandleSource for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>> {
        let pair = lookup_pair(SYMBOL_PAIRS, self.name(), symbol)?;
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            BINANCE_API_URL,
            pair,
            interval(timeframe),
            limit.clamp(1, MAX_LIMIT)
        );

        let response = check_status(self.name(), self.client.get(&url).send().await?).await?;
        let rows: Vec<Vec<Value>> = response.json().await?;
        let candles = parse_klines(&rows);
        debug!("Binance returned {} candles for {} {}", candles.len(), pair, timeframe);
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_klines() {
        let body = json!([
            [1700000000000i64, "100.0", "101.0", "99.0", "100.5", "12.5", 1700000059999i64, "0", 10, "0", "0", "0"],
            [1700000060000i64, "100.5", "102.0", "100.0", "101.5", "8.0", 1700000119999i64, "0", 10, "0", "0", "0"]
        ]);
        let rows: Vec<Vec<Value>> = serde_json::from_value(body).unwrap();
        let candles = parse_klines(&rows);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, 1_700_000_000_000);
        assert_eq!(candles[1].close, 101.5);
        assert_eq!(candles[0].volume, 12.5);
    }

    #[test]
    fn test_interval_labels() {
        assert_eq!(interval(Timeframe::FourHours), "4h");
        assert_eq!(interval(Timeframe::OneDay), "1d");
    }
}
