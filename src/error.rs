use thiserror::Error;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Source error ({source_name}): {message}")]
    Source {
        source_name: String,
        message: String,
    },

    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Circuit breaker open: {0}")]
    CircuitOpen(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported symbol for {source_name}: {symbol}")]
    UnsupportedSymbol { source_name: String, symbol: String },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl EngineError {
    /// Build a source error.
    pub fn source(source_name: &str, message: impl Into<String>) -> Self {
        EngineError::Source {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Unsupported symbols, open circuits and unparseable payloads are permanent for the current call.
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::Source { .. } | EngineError::Timeout(_) => true,
            EngineError::Reqwest(e) => !e.is_decode(),
            EngineError::CircuitOpen(_)
            | EngineError::InvalidInput(_)
            | EngineError::UnsupportedSymbol { .. }
            | EngineError::SerdeJson(_)
            | EngineError::Anyhow(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = EngineError::source("binance", "HTTP 503");
        assert_eq!(err.to_string(), "Source error (binance): HTTP 503");
    }

    #[test]
    fn test_transient_classification() {
        assert!(EngineError::Timeout(5000).is_transient());
        assert!(EngineError::source("okx", "boom").is_transient());
        assert!(!EngineError::CircuitOpen("binance".into()).is_transient());
        assert!(!EngineError::UnsupportedSymbol {
            source_name: "kraken".into(),
            symbol: "zzz".into()
        }
        .is_transient());
    }

    #[test]
    fn test_unparseable_payload_is_permanent() {
        let err: EngineError = serde_json::from_str::<Vec<u32>>("<html>").unwrap_err().into();
        assert!(!err.is_transient());
    }
}
