//! Shared error types for the services crate.

use thiserror::Error;

use srs_core::model::{ReviewError, SessionSummaryError};
use storage::repository::StorageError;

use crate::sessions::SessionState;

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error(transparent)]
    InvalidQuality(#[from] ReviewError),
    /// Initialization or recording could not be persisted.
    #[error("failed to update review record")]
    UpdateFailed(#[source] StorageError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by review sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no items are due for review")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("cannot {action} while session is {from:?}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Review(#[from] ReviewServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
