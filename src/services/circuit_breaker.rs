//! Circuit breaker for unreliable async calls.
//!
//! ```text
//! CLOSED ──failure_threshold──> OPEN ──reset_timeout──> HALF_OPEN
//!   ^                            ^                         │
//!   │                            └──────── failure ────────┤
//!   └──────────────── success_threshold ───────────────────┘
//! ```
//!
//! Every call races `call_timeout`; a timeout counts as a failure.

use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Failing; calls are short-circuited.
    Open,
    /// Probing recovery.
    HalfOpen,
}

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures in CLOSED before opening.
    pub failure_threshold: u32,
    /// Successes in HALF_OPEN before closing.
    pub success_threshold: u32,
    /// Time since the last failure before an OPEN breaker lets a probe through.
    pub reset_timeout: Duration,
    /// Upper bound on a single protected call.
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            success_threshold: 1,
            reset_timeout: Duration::from_secs(30),
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Statistics for circuit breaker monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub failures: u32,
    pub successes: u32,
    pub total_calls: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    pub calls_rejected: u64,
    pub timeouts: u64,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl CircuitBreakerStats {
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.total_failures as f64 / self.total_calls as f64
        }
    }
}

/// Result of a call made with a fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Guarded<T> {
    pub value: T,
    /// True when the fallback produced the value.
    pub degraded: bool,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    successes: u32,
    last_failure: Option<Instant>,
    last_failure_at: Option<DateTime<Utc>>,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            successes: 0,
            last_failure: None,
            last_failure_at: None,
        }
    }

    fn transition_to(&mut self, name: &str, new_state: CircuitState) {
        if self.state == new_state {
            return;
        }
        info!("Circuit breaker {} state transition: {:?} -> {:?}", name, self.state, new_state);
        self.state = new_state;
        match new_state {
            CircuitState::Closed => {
                self.failures = 0;
                self.successes = 0;
            }
            CircuitState::Open | CircuitState::HalfOpen => {
                self.successes = 0;
            }
        }
    }
}

/// Async circuit breaker guarding one call-site.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: RwLock<BreakerState>,

    total_calls: AtomicU64,
    total_failures: AtomicU64,
    total_successes: AtomicU64,
    calls_rejected: AtomicU64,
    timeouts: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: RwLock::new(BreakerState::new()),
            total_calls: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            total_successes: AtomicU64::new(0),
            calls_rejected: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn state(&self) -> CircuitState {
        self.state.read().await.state
    }

    /// Run `op` through the breaker.
    ///
    /// Returns `EngineError::CircuitOpen` without running `op` while OPEN.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.should_allow_call().await {
            self.calls_rejected.fetch_add(1, Ordering::Relaxed);
            debug!("Circuit breaker {} rejected call", self.name);
            return Err(EngineError::CircuitOpen(self.name.clone()));
        }

        self.total_calls.fetch_add(1, Ordering::Relaxed);
        match tokio::time::timeout(self.config.call_timeout, op()).await {
            Ok(Ok(value)) => {
                self.record_success().await;
                Ok(value)
            }
            Ok(Err(e)) => {
                self.record_failure().await;
                Err(e)
            }
            Err(_) => {
                self.timeouts.fetch_add(1, Ordering::Relaxed);
                self.record_failure().await;
                Err(EngineError::Timeout(self.config.call_timeout.as_millis() as u64))
            }
        }
    }

    /// Run `op`, substituting `fallback()` on rejection, error or timeout.
    pub async fn call_with_fallback<T, F, Fut, FB>(&self, op: F, fallback: FB) -> Guarded<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        FB: FnOnce() -> T,
    {
        match self.call(op).await {
            Ok(value) => Guarded {
                value,
                degraded: false,
            },
            Err(e) => {
                warn!("Circuit breaker {} using fallback: {}", self.name, e);
                Guarded {
                    value: fallback(),
                    degraded: true,
                }
            }
        }
    }

    async fn should_allow_call(&self) -> bool {
        let mut guard = self.state.write().await;
        match guard.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let ready = guard
                    .last_failure
                    .map_or(true, |at| at.elapsed() >= self.config.reset_timeout);
                if ready {
                    guard.transition_to(&self.name, CircuitState::HalfOpen);
                }
                ready
            }
        }
    }

    async fn record_success(&self) {
        self.total_successes.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.state.write().await;
        match guard.state {
            CircuitState::Closed => guard.failures = 0,
            CircuitState::HalfOpen => {
                guard.successes += 1;
                if guard.successes >= self.config.success_threshold {
                    guard.transition_to(&self.name, CircuitState::Closed);
                }
            }
            CircuitState::Open => {}
        }
    }

    async fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.state.write().await;
        guard.last_failure = Some(Instant::now());
        guard.last_failure_at = Some(Utc::now());
        match guard.state {
            CircuitState::Closed => {
                guard.failures += 1;
                if guard.failures >= self.config.failure_threshold {
                    guard.transition_to(&self.name, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                guard.failures += 1;
                guard.transition_to(&self.name, CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    /// Get current circuit breaker statistics.
    pub async fn stats(&self) -> CircuitBreakerStats {
        let guard = self.state.read().await;
        CircuitBreakerStats {
            name: self.name.clone(),
            state: guard.state,
            failures: guard.failures,
            successes: guard.successes,
            total_calls: self.total_calls.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            total_successes: self.total_successes.load(Ordering::Relaxed),
            calls_rejected: self.calls_rejected.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            last_failure_at: guard.last_failure_at,
        }
    }

    /// Reset to CLOSED and clear counters.
    pub async fn reset(&self) {
        let mut guard = self.state.write().await;
        guard.transition_to(&self.name, CircuitState::Closed);
        *guard = BreakerState::new();

        self.total_calls.store(0, Ordering::Relaxed);
        self.total_failures.store(0, Ordering::Relaxed);
        self.total_successes.store(0, Ordering::Relaxed);
        self.calls_rejected.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
    }
}

/// Named breakers, one per protected call-site.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Breaker for `name`, created on first use.
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config.clone())))
            .clone()
    }

    /// Stats for every breaker, sorted by name.
    pub async fn stats(&self) -> Vec<CircuitBreakerStats> {
        let breakers: Vec<Arc<CircuitBreaker>> = self.breakers.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::with_capacity(breakers.len());
        for breaker in breakers {
            out.push(breaker.stats().await);
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
