use thiserror::Error;

use crate::media::storage::StorageError;

pub type PropertyResult<T> = Result<T, PropertyError>;

/// Failures of the property flows, one variant per HTTP outcome.
#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("{0}")]
    Validation(String),

    #[error("Property not found")]
    NotFound(u64),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl PropertyError {
    pub fn persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}
