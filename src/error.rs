//! Error taxonomy shared across the engine layers

use crate::models::job::JobStatus;
use thiserror::Error;

/// Startup configuration problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Failures reported by a market-data provider
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// The provider has nothing for this ticker / line item
    #[error("data unavailable for {ticker}: {reason}")]
    Unavailable { ticker: String, reason: String },
    #[error("market data transport error: {0}")]
    Transport(String),
    #[error("failed to decode market data: {0}")]
    Decode(String),
}

impl MarketDataError {
    pub fn unavailable(ticker: &str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Failure scoped to a single detector invocation.
///
/// Never escapes the pipeline: the stage logs it and omits the ticker's result.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("{ticker}: insufficient data ({reason})")]
    DataUnavailable { ticker: String, reason: String },
    #[error("{ticker}: computation failed ({reason})")]
    Computation { ticker: String, reason: String },
}

impl SignalError {
    pub fn unavailable(ticker: &str, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }

    pub fn computation(ticker: &str, reason: impl Into<String>) -> Self {
        Self::Computation {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }

    /// Classify a provider failure for `ticker`.
    pub fn from_market(ticker: &str, e: MarketDataError) -> Self {
        match e {
            MarketDataError::Unavailable { reason, .. } => Self::unavailable(ticker, reason),
            other => Self::computation(ticker, other.to_string()),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}

/// Persistence failures; the enclosing transaction has already been rolled back
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("analysis {0} not found")]
    NotFound(String),
    #[error("analysis {id}: illegal status transition {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Failures of the reasoning/report collaborator
#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("reasoning service returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// An error that escaped the whole pipeline; forces the job into FAILED
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Reasoning(#[from] ReasoningError),
}

/// Errors raised while bringing the service up
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
