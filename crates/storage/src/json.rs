use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{AnalyticsState, FlashcardRecord, QuizRecord};

use crate::repository::{
    AnalyticsRepository, ProgressRepository, RecordId, Storage, StorageError,
};

/// Errors raised while opening or writing the JSON store file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JsonStoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// On-disk shape of the store: one flat document keyed by concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    quizzes: Vec<QuizRecord>,
    #[serde(default)]
    flashcard_sessions: Vec<FlashcardRecord>,
    #[serde(default)]
    analytics: AnalyticsState,
}

/// Flat-file JSON key-value store for progress and analytics.
///
/// The whole document is held in memory and rewritten on every mutation
/// via a sibling temp file and rename, so a crash mid-write leaves the
/// previous document intact. Suited to the single-writer model of this
/// app; not a concurrent database.
#[derive(Clone)]
pub struct JsonStore {
    path: PathBuf,
    document: Arc<Mutex<StoreDocument>>,
}

impl JsonStore {
    /// Open the store at `path`, creating an empty document if the file
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `JsonStoreError` when the file exists but cannot be read
    /// or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JsonStoreError> {
        let path = path.as_ref().to_path_buf();
        let document = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                StoreDocument::default()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            StoreDocument::default()
        };

        Ok(Self {
            path,
            document: Arc::new(Mutex::new(document)),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, document: &StoreDocument) -> Result<(), StorageError> {
        let serialized = serde_json::to_string_pretty(document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized).map_err(|e| StorageError::Io(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(())
    }

    fn with_document<T>(
        &self,
        mutate: impl FnOnce(&mut StoreDocument) -> T,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .document
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        let value = mutate(&mut guard);
        self.write_document(&guard)?;
        Ok(value)
    }

    fn read_document<T>(&self, read: impl FnOnce(&StoreDocument) -> T) -> Result<T, StorageError> {
        let guard = self
            .document
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(read(&guard))
    }
}

#[async_trait]
impl ProgressRepository for JsonStore {
    async fn append_quiz(&self, record: &QuizRecord) -> Result<RecordId, StorageError> {
        self.with_document(|doc| {
            doc.quizzes.push(record.clone());
            doc.quizzes.len() as RecordId
        })
    }

    async fn append_flashcard(&self, record: &FlashcardRecord) -> Result<RecordId, StorageError> {
        self.with_document(|doc| {
            doc.flashcard_sessions.push(record.clone());
            doc.flashcard_sessions.len() as RecordId
        })
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizRecord>, StorageError> {
        self.read_document(|doc| doc.quizzes.clone())
    }

    async fn list_flashcards(&self) -> Result<Vec<FlashcardRecord>, StorageError> {
        self.read_document(|doc| doc.flashcard_sessions.clone())
    }
}

#[async_trait]
impl AnalyticsRepository for JsonStore {
    async fn load_analytics(&self) -> Result<AnalyticsState, StorageError> {
        self.read_document(|doc| doc.analytics.clone())
    }

    async fn store_analytics(&self, state: &AnalyticsState) -> Result<(), StorageError> {
        self.with_document(|doc| {
            doc.analytics = state.clone();
        })
    }
}

impl Storage {
    /// Build storage backed by a JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `JsonStoreError` when an existing file cannot be read or
    /// parsed.
    pub fn json(path: impl AsRef<Path>) -> Result<Self, JsonStoreError> {
        let store = JsonStore::open(path)?;
        let progress: Arc<dyn ProgressRepository> = Arc::new(store.clone());
        let analytics: Arc<dyn AnalyticsRepository> = Arc::new(store);
        Ok(Self {
            progress,
            analytics,
        })
    }
}
