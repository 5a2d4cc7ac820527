//! Signal orchestration: candles in, trust-scored trading signal out.

use crate::config::EngineConfig;
use crate::services::candles::CandleFeed;
use crate::services::circuit_breaker::{BreakerRegistry, CircuitBreakerStats};
use crate::services::ml::{ClusteringResult, MlEngine};
use crate::services::quality::{assess_quality, tag};
use crate::services::signals::patterns::PatternDetector;
use crate::services::signals::regime::RegimeClassifier;
use crate::services::signals::{compute_indicators, compute_readings, score_confluence};
use crate::sources::{build_sources, CandleSource};
use crate::types::{
    Candle, CandleSeries, DataQuality, DataSource, FeatureVector, LabeledOutcome, MarketCluster, MarketContext,
    ModelMetrics, ModelWeights, PatternBias, PatternMatch, Recommendation, Sourced, SyntheticDataPolicy,
    Timeframe, TradeDirection, TradingSignal,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stop distance in ATRs, before the regime multiplier.
const STOP_ATR: f64 = 1.5;
/// Target distances in ATRs, before the regime multiplier.
const TARGET_ATRS: [f64; 3] = [2.0, 3.0, 5.0];
/// Fallback ATR as a fraction of price.
const FALLBACK_ATR_PCT: f64 = 0.01;
/// Confidence points per aligned (or opposing) pattern.
const PATTERN_BOOST: f64 = 5.0;
const MAX_PATTERN_BOOST: f64 = 10.0;

/// External market and agent context (funding, sentiment, TVL, gas, agent history).
#[async_trait]
pub trait MarketContextProvider: Send + Sync {
    async fn context(&self, symbol: &str) -> MarketContext;
}

/// Provider with no external data: flat funding and every other field missing, all tagged synthetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralContext;

#[async_trait]
impl MarketContextProvider for NeutralContext {
    async fn context(&self, _symbol: &str) -> MarketContext {
        MarketContext {
            funding_rate: Some(Sourced::synthetic(0.0)),
            ..MarketContext::default()
        }
    }
}

/// Stop loss and targets for an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeLevels {
    pub stop_loss: f64,
    pub targets: Vec<f64>,
    pub risk_reward: f64,
}

/// Place stop and targets `atr × multiplier` apart on the appropriate sides.
///
/// A non-positive ATR falls back to 1% of the entry. Prices never go below zero.
pub fn trade_levels(entry: f64, atr: f64, multiplier: f64, direction: TradeDirection) -> TradeLevels {
    let atr = if atr > 0.0 { atr } else { entry * FALLBACK_ATR_PCT };
    let unit = atr * multiplier;
    let side = match direction {
        TradeDirection::Long => 1.0,
        TradeDirection::Short => -1.0,
    };

    let risk = unit * STOP_ATR;
    let stop_loss = (entry - side * risk).max(0.0);
    let targets: Vec<f64> = TARGET_ATRS.iter().map(|m| (entry + side * unit * m).max(0.0)).collect();
    let risk_reward = if risk > 0.0 {
        ((targets[0] - entry).abs() / risk * 100.0).round() / 100.0
    } else {
        0.0
    };

    TradeLevels {
        stop_loss,
        targets,
        risk_reward,
    }
}

/// Confidence adjustment from patterns agreeing or disagreeing with the trade.
pub fn pattern_boost(patterns: &[PatternMatch], direction: TradeDirection) -> f64 {
    let wanted = match direction {
        TradeDirection::Long => PatternBias::Bullish,
        TradeDirection::Short => PatternBias::Bearish,
    };
    let net: f64 = patterns
        .iter()
        .map(|p| if p.direction == wanted { PATTERN_BOOST } else { -PATTERN_BOOST })
        .sum();
    net.clamp(-MAX_PATTERN_BOOST, MAX_PATTERN_BOOST)
}

/// Fill price and volume movement from the candles when the provider has none.
fn with_candle_context(mut ctx: MarketContext, candles: &[Candle]) -> MarketContext {
    if let [.., prev, last] = candles {
        if ctx.price.is_none() {
            ctx.price = Some(last.close);
            ctx.previous_price = Some(prev.close);
        }
        if ctx.volume.is_none() {
            ctx.volume = Some(last.volume);
            ctx.previous_volume = Some(prev.volume);
        }
    }
    ctx
}

fn quality_tags(series: &CandleSeries, ctx: &MarketContext) -> DataQuality {
    let candles = series.source;
    let funding = ctx.funding_rate.as_ref().map_or(DataSource::Synthetic, |f| f.source);
    assess_quality(vec![
        tag("candles", candles),
        tag("indicators", candles),
        tag("patterns", candles),
        tag("funding_rate", funding),
        tag("sentiment", ctx.sentiment_source),
        tag("market_context", ctx.source),
    ])
}

/// Owns every stateful piece of the pipeline.
pub struct SignalEngine {
    config: EngineConfig,
    feed: CandleFeed,
    context: Arc<dyn MarketContextProvider>,
    ml: MlEngine,
    breakers: Arc<BreakerRegistry>,
    patterns: PatternDetector,
    regime: RegimeClassifier,
}

impl SignalEngine {
    pub fn new(
        config: EngineConfig,
        sources: Vec<Arc<dyn CandleSource>>,
        context: Arc<dyn MarketContextProvider>,
    ) -> Self {
        let breakers = Arc::new(BreakerRegistry::new(config.breaker.clone()));
        let feed = CandleFeed::new(
            sources,
            breakers.clone(),
            config.retry.clone(),
            config.cache_ttl,
            config.candle_limit,
            config.synthetic_seed,
        );
        let ml = MlEngine::new(config.ml.clone(), config.default_gas_price);

        Self {
            config,
            feed,
            context,
            ml,
            breakers,
            patterns: PatternDetector::default(),
            regime: RegimeClassifier::default(),
        }
    }

    /// Engine over the configured exchange sources with a neutral context.
    pub fn from_config(config: EngineConfig) -> Self {
        let sources = build_sources(&config.candle_sources, config.request_timeout);
        let engine = Self::new(config, sources, Arc::new(NeutralContext));
        info!("Signal engine sources: {:?}", engine.feed.source_names());
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a signal for `symbol`, preferring `exchange` as the candle source.
    ///
    /// Returns `None` when confluence recommends avoiding the trade, when no
    /// candles are available, or when the candles are synthetic under the strict policy.
    pub async fn generate_trading_signal(
        &self,
        symbol: &str,
        exchange: &str,
        timeframe: Timeframe,
    ) -> Option<TradingSignal> {
        let series = self.feed.fetch_preferring(symbol, timeframe, exchange).await;

        if series.is_synthetic() && self.config.synthetic_policy == SyntheticDataPolicy::Strict {
            warn!("Rejecting signal for {} {}: candles are synthetic", series.symbol, timeframe);
            return None;
        }
        if series.is_empty() {
            warn!("No candles for {} {}", series.symbol, timeframe);
            return None;
        }

        let candles = &series.candles;
        let indicators = compute_indicators(candles);
        let readings = compute_readings(candles);
        let regime = self.regime.classify(candles);
        let patterns = self
            .patterns
            .detect(candles, regime.threshold_multiplier, timeframe.as_str());

        let confluence = score_confluence(&indicators, candles);
        if confluence.recommendation == Recommendation::Avoid {
            debug!(
                "No signal for {} {}: best confluence {} at {:.1}",
                series.symbol, timeframe, confluence.direction, confluence.score
            );
            return None;
        }

        let ctx = with_candle_context(self.context.context(&series.symbol).await, candles);
        let features = self.ml.extract_features(&ctx);
        let prediction = self.ml.predict(&features).await;
        let data_quality = quality_tags(&series, &ctx);

        let direction = confluence.direction;
        let levels = trade_levels(indicators.price, indicators.atr, regime.threshold_multiplier, direction);

        let mut confidence = (0.6 * confluence.score
            + 0.4 * prediction.risk_adjusted_score
            + pattern_boost(&patterns, direction))
        .clamp(0.0, 100.0);

        let mut warnings = Vec::new();
        let synthetic = data_quality.synthetic_modules();
        if !synthetic.is_empty() {
            warnings.push(format!("Synthetic data used for: {}", synthetic.join(", ")));
        }
        if self.config.synthetic_policy == SyntheticDataPolicy::Advisory && !data_quality.is_fully_real() {
            confidence *= data_quality.quality_score / 100.0;
            if series.is_synthetic() {
                warnings.push("Price data is synthetic; levels are illustrative only".to_string());
            }
        }

        info!(
            "Signal {} {} {}: {} {} score {:.1}, confidence {:.1}, quality {:?}",
            series.symbol,
            series.provider,
            timeframe,
            confluence.recommendation.label(),
            direction,
            confluence.score,
            confidence,
            data_quality.overall_quality
        );

        Some(TradingSignal {
            id: Uuid::new_v4(),
            symbol: series.symbol.clone(),
            exchange: series.provider.clone(),
            timeframe,
            direction,
            entry: indicators.price,
            stop_loss: levels.stop_loss,
            targets: levels.targets,
            risk_reward: levels.risk_reward,
            indicators,
            readings,
            regime,
            patterns,
            confluence,
            prediction,
            data_quality,
            confidence,
            warnings,
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Feed labeled outcomes to the model.
    pub async fn train_model(&self, points: Vec<LabeledOutcome>) -> ModelMetrics {
        self.ml.train(points).await
    }

    /// Re-cluster an explicit dataset without training.
    pub fn cluster(&self, points: &[FeatureVector]) -> ClusteringResult {
        self.ml.cluster(points)
    }

    pub fn clusters(&self) -> Vec<MarketCluster> {
        self.ml.clusters()
    }

    pub async fn weights(&self) -> ModelWeights {
        self.ml.weights().await
    }

    pub async fn metrics(&self) -> ModelMetrics {
        self.ml.metrics().await
    }

    pub async fn breaker_stats(&self) -> Vec<CircuitBreakerStats> {
        self.breakers.stats().await
    }

    /// Fetch candles for several symbols concurrently.
    pub async fn fetch_many(&self, symbols: &[String], timeframe: Timeframe) -> Vec<CandleSeries> {
        self.feed.fetch_many(symbols, timeframe).await
    }
}
