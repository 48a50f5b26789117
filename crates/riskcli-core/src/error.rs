use thiserror::Error;

use crate::provider::ProviderError;

/// Input validation errors exposed by `riskcli-core`.
///
/// Every variant maps to the `InvalidInput` class: it is reported straight
/// back to the caller and never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid period '{value}', expected one of 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max")]
    InvalidPeriod { value: String },
    #[error("invalid interval '{value}', expected one of 1m, 5m, 15m, 30m, 1h, 1d, 5d, 1wk, 1mo, 3mo")]
    InvalidInterval { value: String },

    #[error("risk-free rate '{value}' is not a number")]
    InvalidRate { value: String },
    #[error("risk-free rate {value} is below -100%")]
    RateBelowFloor { value: f64 },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be strictly positive")]
    NonPositiveValue { field: &'static str },
    #[error("timestamps must be strictly increasing (index {index})")]
    UnorderedTimestamps { index: usize },

    #[error("unsupported export format '{value}', use .json or .csv")]
    UnsupportedExportFormat { value: String },

    #[error("environment variable {key}='{value}' is not a valid non-negative integer")]
    InvalidConfigValue { key: &'static str, value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("data unavailable for '{symbol}' after {attempts} attempt(s): {source}")]
    DataUnavailable {
        symbol: String,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Stable machine-readable code, in the same `area.kind` shape as
    /// [`ProviderError::code`].
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "core.invalid_input",
            Self::InsufficientData { .. } => "core.insufficient_data",
            Self::DataUnavailable { .. } => "core.data_unavailable",
            Self::Serialization(_) => "core.serialization",
        }
    }
}
