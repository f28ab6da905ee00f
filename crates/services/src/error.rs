//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Errors emitted while building a catalog from loaded reference data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("reference dataset contains no pieces")]
    NoPieces,
    #[error("failed to parse catalog snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("reference data has not finished loading")]
    DataUnavailable,
    #[error("need at least 5 pieces for an exam simulation, only {available} available")]
    InsufficientPieces { available: usize },
    #[error("no pieces match the requested selection")]
    EmptySelection,
    #[error("no flashcards match the current filters")]
    EmptyDeck,
    #[error("current question was already answered")]
    AlreadyAnswered,
    #[error("card must be flipped before responding")]
    NotFlipped,
    #[error("deck cannot change while a session is active")]
    SessionActive,
    #[error("session already completed")]
    Completed,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the analytics service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AnalyticsError> for SessionError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Storage(e) => Self::Storage(e),
        }
    }
}
