pub mod cache;
pub mod candles;
pub mod circuit_breaker;
pub mod engine;
pub mod ml;
pub mod quality;
pub mod retry;
pub mod signals;

pub use cache::Cache;
pub use candles::CandleFeed;
pub use circuit_breaker::{BreakerRegistry, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use engine::{MarketContextProvider, NeutralContext, SignalEngine};
pub use ml::MlEngine;
pub use quality::assess_quality;
pub use retry::RetryPolicy;
