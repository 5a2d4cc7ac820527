use crate::services::circuit_breaker::CircuitBreakerConfig;
use crate::services::retry::RetryPolicy;
use crate::types::SyntheticDataPolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// K-means and online-training parameters.
#[derive(Debug, Clone)]
pub struct MlConfig {
    /// Number of clusters.
    pub k: usize,
    pub max_iterations: usize,
    /// Centroid shift below which clustering has converged.
    pub tolerance: f64,
    /// Per-step weight nudge.
    pub learning_rate: f64,
    /// Labeled points required before training adjusts weights.
    pub min_training_points: usize,
    /// Window for metrics.
    pub metrics_window: usize,
    /// Seed for centroid sampling.
    pub seed: u64,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            k: 5,
            max_iterations: 100,
            tolerance: 0.001,
            learning_rate: 0.01,
            min_training_points: 10,
            metrics_window: 100,
            seed: 42,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Candle sources in priority order.
    pub candle_sources: Vec<String>,
    /// Bars requested per fetch.
    pub candle_limit: usize,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub breaker: CircuitBreakerConfig,
    pub retry: RetryPolicy,
    pub synthetic_policy: SyntheticDataPolicy,
    pub ml: MlConfig,
    /// Gas price used when the context has none.
    pub default_gas_price: f64,
    /// Seed for synthetic candles.
    pub synthetic_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candle_sources: vec!["binance".to_string(), "okx".to_string(), "kraken".to_string()],
            candle_limit: 200,
            cache_ttl: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            breaker: CircuitBreakerConfig::default(),
            retry: RetryPolicy::default(),
            synthetic_policy: SyntheticDataPolicy::Strict,
            ml: MlConfig::default(),
            default_gas_price: 50.0,
            synthetic_seed: 7,
        }
    }
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl EngineConfig {
    /// Load configuration from the environment, falling back to defaults per key.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let candle_sources = env::var("CANDLE_SOURCES")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|name| name.trim().to_lowercase())
                    .filter(|name| !name.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.candle_sources);

        let request_timeout = parsed::<u64>("REQUEST_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);

        let breaker = CircuitBreakerConfig {
            failure_threshold: parsed("BREAKER_FAILURE_THRESHOLD").unwrap_or(defaults.breaker.failure_threshold),
            success_threshold: parsed("BREAKER_SUCCESS_THRESHOLD").unwrap_or(defaults.breaker.success_threshold),
            reset_timeout: parsed::<u64>("BREAKER_RESET_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.breaker.reset_timeout),
            // A breaker call wraps the retries, so it gets room for all of them.
            call_timeout: parsed::<u64>("BREAKER_CALL_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(request_timeout * 3),
        };

        let retry = RetryPolicy {
            max_attempts: parsed("RETRY_MAX_ATTEMPTS").unwrap_or(defaults.retry.max_attempts),
            base_delay: parsed::<u64>("RETRY_BASE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.base_delay),
            max_delay: parsed::<u64>("RETRY_MAX_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.max_delay),
        };

        let ml = MlConfig {
            k: parsed("KMEANS_K").unwrap_or(defaults.ml.k),
            max_iterations: parsed("KMEANS_MAX_ITERATIONS").unwrap_or(defaults.ml.max_iterations),
            tolerance: parsed("KMEANS_TOLERANCE").unwrap_or(defaults.ml.tolerance),
            learning_rate: parsed("ML_LEARNING_RATE").unwrap_or(defaults.ml.learning_rate),
            min_training_points: parsed("ML_MIN_TRAINING_POINTS").unwrap_or(defaults.ml.min_training_points),
            metrics_window: parsed("ML_METRICS_WINDOW").unwrap_or(defaults.ml.metrics_window),
            seed: parsed("ML_SEED").unwrap_or(defaults.ml.seed),
        };

        Self {
            candle_sources,
            candle_limit: parsed("CANDLE_LIMIT").unwrap_or(defaults.candle_limit),
            cache_ttl: parsed::<u64>("CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            request_timeout,
            breaker,
            retry,
            synthetic_policy: env::var("SYNTHETIC_POLICY")
                .ok()
                .and_then(|s| SyntheticDataPolicy::from_str(&s))
                .unwrap_or(defaults.synthetic_policy),
            ml,
            default_gas_price: parsed("DEFAULT_GAS_PRICE").unwrap_or(defaults.default_gas_price),
            synthetic_seed: parsed("SYNTHETIC_SEED").unwrap_or(defaults.synthetic_seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.candle_sources, vec!["binance", "okx", "kraken"]);
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.synthetic_policy, SyntheticDataPolicy::Strict);
        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.breaker.success_threshold, 1);
        assert_eq!(config.ml.k, 5);
        assert_eq!(config.ml.max_iterations, 100);
        assert_eq!(config.default_gas_price, 50.0);
    }

    // All env-dependent assertions live in one test so parallel tests
    // never observe each other's variables.
    #[test]
    fn test_from_env_overrides_and_fallbacks() {
        env::set_var("CANDLE_SOURCES", "Kraken, okx");
        env::set_var("KMEANS_K", "3");
        env::set_var("SYNTHETIC_POLICY", "advisory");
        env::set_var("CANDLE_LIMIT", "not-a-number");

        let config = EngineConfig::from_env();
        assert_eq!(config.candle_sources, vec!["kraken", "okx"]);
        assert_eq!(config.ml.k, 3);
        assert_eq!(config.synthetic_policy, SyntheticDataPolicy::Advisory);
        assert_eq!(config.candle_limit, 200);

        env::remove_var("CANDLE_SOURCES");
        env::remove_var("KMEANS_K");
        env::remove_var("SYNTHETIC_POLICY");
        env::remove_var("CANDLE_LIMIT");
    }
}
