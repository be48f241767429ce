//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tracker_core::InputError;

/// Errors emitted by `TrackingService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackingError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TrackingError {
    /// Only an unreachable store is worth retrying; bad input stays bad.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            TrackingError::Storage(err) => err.is_retryable(),
            TrackingError::InvalidInput(_) => false,
        }
    }
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProgressError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        let ProgressError::Storage(err) = self;
        err.is_retryable()
    }
}

/// Errors emitted by `PositionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PositionError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
