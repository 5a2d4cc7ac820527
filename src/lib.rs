//! Haunt Signals - market signal intelligence over multi-exchange candles

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

pub use config::{EngineConfig, MlConfig};
pub use error::{EngineError, Result};
pub use services::{MarketContextProvider, NeutralContext, SignalEngine};
pub use sources::CandleSource;
pub use types::*;
