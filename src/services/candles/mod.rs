//! Candle data fusion: priority cascade over sources with cache, breaker and
//! retry per source, and a tagged synthetic fallback.

pub mod synthetic;

use crate::services::cache::{candle_key, Cache};
use crate::services::circuit_breaker::BreakerRegistry;
use crate::services::retry::RetryPolicy;
use crate::sources::CandleSource;
use crate::types::{normalize_candles, Candle, CandleSeries, DataSource, Timeframe};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Provider name on synthetic series.
pub const SYNTHETIC_PROVIDER: &str = "synthetic";

/// Breaker name for a source's candle endpoint.
pub fn breaker_name(source: &str) -> String {
    format!("candles:{}", source)
}

/// Fetches candle series through the configured sources in priority order.
pub struct CandleFeed {
    sources: Vec<Arc<dyn CandleSource>>,
    cache: Cache<Vec<Candle>>,
    breakers: Arc<BreakerRegistry>,
    retry: RetryPolicy,
    limit: usize,
    synthetic_seed: u64,
}

impl CandleFeed {
    pub fn new(
        sources: Vec<Arc<dyn CandleSource>>,
        breakers: Arc<BreakerRegistry>,
        retry: RetryPolicy,
        cache_ttl: Duration,
        limit: usize,
        synthetic_seed: u64,
    ) -> Self {
        Self {
            sources,
            cache: Cache::new(cache_ttl),
            breakers,
            retry,
            limit: limit.max(1),
            synthetic_seed,
        }
    }

    /// Source names in priority order.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Fetch one series. Never fails: exhausting every source yields synthetic data.
    pub async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> CandleSeries {
        self.cascade(symbol, timeframe, self.sources.iter().collect()).await
    }

    /// Like [`fetch`](Self::fetch), but tries `exchange` first when it is a configured source.
    pub async fn fetch_preferring(&self, symbol: &str, timeframe: Timeframe, exchange: &str) -> CandleSeries {
        let (mut order, rest): (Vec<_>, Vec<_>) = self
            .sources
            .iter()
            .partition(|s| s.name().eq_ignore_ascii_case(exchange));
        order.extend(rest);
        self.cascade(symbol, timeframe, order).await
    }

    async fn cascade(&self, symbol: &str, timeframe: Timeframe, order: Vec<&Arc<dyn CandleSource>>) -> CandleSeries {
        let symbol = symbol.to_lowercase();

        for source in order {
            let key = candle_key(&symbol, source.name(), timeframe);
            if let Some(candles) = self.cache.get(&key) {
                debug!("Cache hit for {}", key);
                return self.series(&symbol, timeframe, candles, DataSource::Real, source.name(), true);
            }

            match self.fetch_from(source.as_ref(), &symbol, timeframe).await {
                Ok(candles) if !candles.is_empty() => {
                    info!("[{}] Fetched {} candles for {} {}", source.name(), candles.len(), symbol, timeframe);
                    self.cache.cleanup();
                    self.cache.set(key, candles.clone());
                    return self.series(&symbol, timeframe, candles, DataSource::Real, source.name(), false);
                }
                Ok(_) => {
                    warn!("[{}] Returned no usable candles for {} {}", source.name(), symbol, timeframe);
                }
                Err(e) => {
                    warn!("[{}] Candle fetch failed for {} {}: {}", source.name(), symbol, timeframe, e);
                }
            }
        }

        warn!("No candle source served {} {}, using synthetic data", symbol, timeframe);
        let candles = synthetic::generate(
            &symbol,
            timeframe,
            self.limit,
            self.synthetic_seed,
            chrono::Utc::now().timestamp_millis(),
        );
        self.series(&symbol, timeframe, candles, DataSource::Synthetic, SYNTHETIC_PROVIDER, false)
    }

    /// Fetch several symbols concurrently.
    pub async fn fetch_many(&self, symbols: &[String], timeframe: Timeframe) -> Vec<CandleSeries> {
        join_all(symbols.iter().map(|symbol| self.fetch(symbol, timeframe))).await
    }

    async fn fetch_from(
        &self,
        source: &dyn CandleSource,
        symbol: &str,
        timeframe: Timeframe,
    ) -> crate::error::Result<Vec<Candle>> {
        let breaker = self.breakers.get(&breaker_name(source.name()));
        let label = format!("{} {} {}", source.name(), symbol, timeframe);
        let retry = &self.retry;
        let limit = self.limit;

        let raw = breaker
            .call(|| retry.run(&label, move || source.fetch_candles(symbol, timeframe, limit)))
            .await?;
        Ok(normalize_candles(raw))
    }

    fn series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: Vec<Candle>,
        source: DataSource,
        provider: &str,
        cached: bool,
    ) -> CandleSeries {
        CandleSeries {
            symbol: symbol.to_string(),
            timeframe,
            candles,
            source,
            provider: provider.to_string(),
            cached,
            fetched_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
