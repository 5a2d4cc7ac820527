use super::{check_status, http_client, lookup_pair, parse_row, CandleSource};
use crate::error::{EngineError, Result};
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const OKX_API_URL: &str = "https://www.okx.com/api/v5";
const MAX_LIMIT: usize = 300;

/// Symbol mapping for OKX (symbol -> OKX instrument ID).
pub const SYMBOL_PAIRS: &[(&str, &str)] = &[
    ("btc", "BTC-USDT"),
    ("eth", "ETH-USDT"),
    ("sol", "SOL-USDT"),
    ("xrp", "XRP-USDT"),
    ("doge", "DOGE-USDT"),
    ("ada", "ADA-USDT"),
    ("avax", "AVAX-USDT"),
    ("dot", "DOT-USDT"),
    ("link", "LINK-USDT"),
    ("ltc", "LTC-USDT"),
    ("atom", "ATOM-USDT"),
    ("uni", "UNI-USDT"),
    ("near", "NEAR-USDT"),
    ("apt", "APT-USDT"),
];

/// OKX candles response.
#[derive(Debug, Deserialize)]
struct OkxResponse {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

fn bar(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::OneMinute => "1m",
        Timeframe::FiveMinutes => "5m",
        Timeframe::FifteenMinutes => "15m",
        Timeframe::OneHour => "1H",
        Timeframe::FourHours => "4H",
        Timeframe::OneDay => "1D",
    }
}

/// Rows are `[ts(ms), open, high, low, close, vol, ...]`, newest first.
fn parse_candles(response: OkxResponse) -> Result<Vec<Candle>> {
    if response.code != "0" {
        return Err(EngineError::source(
            "okx",
            format!("code {}: {}", response.code, response.msg),
        ));
    }
    Ok(response
        .data
        .iter()
        .filter_map(|row| parse_row(row, 1, 5))
        .collect())
}

/// OKX public candles client.
#[derive(Clone)]
pub struct OkxClient {
    client: Client,
}

impl OkxClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl CandleSource for OkxClient {
    fn name(&self) -> &str {
        "okx"
    }

    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>> {
        let inst_id = lookup_pair(SYMBOL_PAIRS, self.name(), symbol)?;
        let url = format!(
            "{}/market/candles?instId={}&bar={}&limit={}",
            OKX_API_URL,
            inst_id,
            bar(timeframe),
            limit.clamp(1, MAX_LIMIT)
        );

        let response = check_status(self.name(), self.client.get(&url).send().await?).await?;
        let data: OkxResponse = response.json().await?;
        let candles = parse_candles(data)?;
        debug!("OKX returned {} candles for {} {}", candles.len(), inst_id, timeframe);
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_candles() {
        let body = json!({
            "code": "0",
            "msg": "",
            "data": [
                ["1700003600000", "100.5", "102.0", "100.0", "101.5", "4.0", "400", "400", "1"],
                ["1700000000000", "100.0", "101.0", "99.0", "100.5", "3.5", "350", "350", "1"]
            ]
        });
        let response: OkxResponse = serde_json::from_value(body).unwrap();
        let candles = parse_candles(response).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, 1_700_003_600_000);
        assert_eq!(candles[1].open, 100.0);
    }

    #[test]
    fn test_error_code() {
        let body = json!({ "code": "51001", "msg": "Instrument ID does not exist", "data": [] });
        let response: OkxResponse = serde_json::from_value(body).unwrap();
        assert!(parse_candles(response).is_err());
    }

    #[test]
    fn test_bar_labels() {
        assert_eq!(bar(Timeframe::OneHour), "1H");
        assert_eq!(bar(Timeframe::FifteenMinutes), "15m");
    }
}
