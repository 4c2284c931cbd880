use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SIMULATED_FAILURE_MESSAGE: &str = "Simulated transfer error: Network issue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Conflict,
    Transfer,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("configuration incomplete: missing {}", .missing.join(", "))]
    ConfigurationIncomplete { missing: Vec<String> },
    #[error("transfer run {run_id} is still {status}")]
    RunInProgress { run_id: i64, status: String },
    #[error("{message}")]
    SimulatedFailure { message: String },
}

impl TransferError {
    pub fn simulated_failure() -> Self {
        Self::SimulatedFailure {
            message: SIMULATED_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TransferError::ConfigurationIncomplete { .. } => ErrorCode::Validation,
            TransferError::RunInProgress { .. } => ErrorCode::Conflict,
            TransferError::SimulatedFailure { .. } => ErrorCode::Transfer,
        }
    }
}

/// Serializable error body handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&TransferError> for ErrorReport {
    fn from(value: &TransferError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}
