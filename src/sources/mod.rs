//! Exchange candle sources.

pub mod binance;
pub mod kraken;
pub mod okx;

pub use binance::BinanceClient;
pub use kraken::KrakenClient;
pub use okx::OkxClient;

use crate::error::{EngineError, Result};
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A provider of OHLCV bars.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Short provider name used for cache keys, breakers and provenance.
    fn name(&self) -> &str;

    /// Fetch up to `limit` of the most recent bars. Order is not guaranteed.
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>>;
}

/// Build the configured sources, in priority order. Unknown names are skipped.
pub fn build_sources(names: &[String], timeout: Duration) -> Vec<Arc<dyn CandleSource>> {
    names
        .iter()
        .filter_map(|name| -> Option<Arc<dyn CandleSource>> {
            match name.trim().to_lowercase().as_str() {
                "binance" => Some(Arc::new(BinanceClient::new(timeout))),
                "kraken" => Some(Arc::new(KrakenClient::new(timeout))),
                "okx" => Some(Arc::new(OkxClient::new(timeout))),
                other => {
                    warn!("Unknown candle source '{}', skipping", other);
                    None
                }
            }
        })
        .collect()
}

/// Shared HTTP client settings.
pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent("Haunt/1.0")
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Look up an exchange pair for a lowercase symbol.
pub(crate) fn lookup_pair(pairs: &[(&str, &'static str)], source: &str, symbol: &str) -> Result<&'static str> {
    let symbol = symbol.to_lowercase();
    pairs
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, p)| *p)
        .ok_or_else(|| EngineError::UnsupportedSymbol {
            source_name: source.to_string(),
            symbol,
        })
}

/// At most `max` characters of `text`, cut on a character boundary.
pub(crate) fn excerpt(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Turn a non-success HTTP status into a source error.
pub(crate) async fn check_status(source: &str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    warn!("{} API returned {}: {}", source, status, excerpt(&text, 200));
    Err(EngineError::source(source, format!("HTTP {}", status)))
}

/// Numeric field that exchanges send either as a JSON string or number.
pub(crate) fn num(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Parse a `[time, open, high, low, close, <ignored>.., volume]` row.
///
/// `time_scale` converts the row's time unit to milliseconds and
/// `volume_index` locates the base volume.
pub(crate) fn parse_row(row: &[Value], time_scale: i64, volume_index: usize) -> Option<Candle> {
    let time = num(row.first()?)? as i64;
    Some(Candle::new(
        time * time_scale,
        num(row.get(1)?)?,
        num(row.get(2)?)?,
        num(row.get(3)?)?,
        num(row.get(4)?)?,
        num(row.get(volume_index)?)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_num_accepts_strings_and_numbers() {
        assert_eq!(num(&json!("1.5")), Some(1.5));
        assert_eq!(num(&json!(2)), Some(2.0));
        assert_eq!(num(&json!(null)), None);
        assert_eq!(num(&json!("abc")), None);
    }

    #[test]
    fn test_parse_row() {
        let row = vec![json!(1_700_000_000), json!("1"), json!("2"), json!("0.5"), json!("1.5"), json!("9")];
        let candle = parse_row(&row, 1000, 5).unwrap();
        assert_eq!(candle.timestamp, 1_700_000_000_000);
        assert_eq!(candle.close, 1.5);
        assert_eq!(candle.volume, 9.0);
        assert!(parse_row(&row[..3], 1000, 5).is_none());
    }

    #[test]
    fn test_excerpt_cuts_on_char_boundary() {
        let body = format!("{}€€", "x".repeat(199));
        assert_eq!(excerpt(&body, 200), format!("{}€", "x".repeat(199)));
        assert_eq!(excerpt("short", 200), "short");
    }

    #[tokio::test]
    async fn test_check_status_with_multibyte_body() {
        let subscriber = tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let body = format!("{}€ service unavailable", "x".repeat(199));
        let response = http::Response::builder().status(503).body(body).unwrap();

        let err = check_status("binance", Response::from(response)).await.unwrap_err();
        assert!(matches!(err, EngineError::Source { ref message, .. } if message.contains("503")));
    }

    #[test]
    fn test_lookup_pair() {
        let pairs: &[(&str, &'static str)] = &[("btc", "BTCUSDT")];
        assert_eq!(lookup_pair(pairs, "binance", "BTC").unwrap(), "BTCUSDT");
        assert!(matches!(
            lookup_pair(pairs, "binance", "zzz"),
            Err(EngineError::UnsupportedSymbol { .. })
        ));
    }

    #[test]
    fn test_build_sources_skips_unknown() {
        let names = vec!["okx".to_string(), "nope".to_string(), "Binance".to_string()];
        let sources = build_sources(&names, Duration::from_secs(1));
        let built: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(built, vec!["okx", "binance"]);
    }
}
