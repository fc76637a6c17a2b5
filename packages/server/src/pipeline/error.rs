use common::storage::StorageError;
use imaging::ImageError;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::ledger::LedgerError;

/// Every way an asset operation can fail. Each kind has a stable code.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    /// Absent or owned by someone else; the two are indistinguishable.
    #[error("image not found")]
    NotFound,

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Transform(String),

    /// Blob store or catalog unreachable, failing, or too slow.
    #[error("{0}")]
    Transport(String),

    /// A catalog record points at bytes that are no longer stored.
    #[error("{0}")]
    StorageInconsistency(String),

    #[error("{0}")]
    Internal(String),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Transform(_) => "TRANSFORM_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::StorageInconsistency(_) => "STORAGE_INCONSISTENCY",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ImageError> for PipelineError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Decode(msg) => Self::Decode(msg),
            ImageError::Transform(msg) => Self::Transform(msg),
        }
    }
}

impl From<CatalogError> for PipelineError {
    fn from(err: CatalogError) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<LedgerError> for PipelineError {
    fn from(err: LedgerError) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Blob store failures other than a missing object, which callers handle
/// themselves.
impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(_)
            | StorageError::InvalidHash(_)
            | StorageError::SizeLimitExceeded { .. } => Self::Validation(err.to_string()),
            StorageError::NotFound(key) => {
                Self::StorageInconsistency(format!("stored object {key} is missing"))
            }
            StorageError::Io(_) | StorageError::Transport(_) | StorageError::Timeout(_) => {
                Self::Transport(err.to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("background task failed: {err}"))
    }
}
