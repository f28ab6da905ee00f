use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{AnalyticsState, FlashcardRecord, QuizRecord};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage identifier for an appended progress record.
pub type RecordId = i64;

/// Repository contract for the append-only quiz/flashcard progress log.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Append a completed quiz result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_quiz(&self, record: &QuizRecord) -> Result<RecordId, StorageError>;

    /// Append a completed flashcard session result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_flashcard(&self, record: &FlashcardRecord) -> Result<RecordId, StorageError>;

    /// All quiz results, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_quizzes(&self) -> Result<Vec<QuizRecord>, StorageError>;

    /// All flashcard session results, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_flashcards(&self) -> Result<Vec<FlashcardRecord>, StorageError>;
}

/// Repository contract for the analytics snapshot.
///
/// Analytics is a single document: listening frequency, exam log and
/// study dates travel together, mirroring the flat key-value layout of
/// the embedding shell's local store.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Load the current analytics snapshot; an empty default if never stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn load_analytics(&self) -> Result<AnalyticsState, StorageError>;

    /// Replace the analytics snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn store_analytics(&self, state: &AnalyticsState) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<Vec<QuizRecord>>>,
    flashcards: Arc<Mutex<Vec<FlashcardRecord>>>,
    analytics: Arc<Mutex<AnalyticsState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn append_quiz(&self, record: &QuizRecord) -> Result<RecordId, StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        guard.push(record.clone());
        Ok(guard.len() as RecordId)
    }

    async fn append_flashcard(&self, record: &FlashcardRecord) -> Result<RecordId, StorageError> {
        let mut guard = self
            .flashcards
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        guard.push(record.clone());
        Ok(guard.len() as RecordId)
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizRecord>, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn list_flashcards(&self) -> Result<Vec<FlashcardRecord>, StorageError> {
        let guard = self
            .flashcards
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryRepository {
    async fn load_analytics(&self) -> Result<AnalyticsState, StorageError> {
        let guard = self
            .analytics
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn store_analytics(&self, state: &AnalyticsState) -> Result<(), StorageError> {
        let mut guard = self
            .analytics
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        *guard = state.clone();
        Ok(())
    }
}

/// Aggregates progress and analytics repositories behind trait objects
/// for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let analytics: Arc<dyn AnalyticsRepository> = Arc::new(repo);
        Self {
            progress,
            analytics,
        }
    }
}
