use riskcli_core::{CoreError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(CoreError),

    #[error("metrics error: {0}")]
    Metrics(CoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("interrupted")]
    Interrupted,
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Fetch(_) => 2,
            Self::Metrics(_) => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
            Self::Interrupted => 130,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Serialization(error) => Self::Serialization(error),
            error @ CoreError::DataUnavailable { .. } => Self::Fetch(error),
            error @ CoreError::InsufficientData { .. } => Self::Metrics(error),
        }
    }
}
