use std::sync::Arc;

use tracing::debug;

use quiz_core::Clock;
use quiz_core::readiness::ReadinessReport;
use quiz_core::scoring::Difficulty;
use storage::repository::Storage;

use crate::analytics::AnalyticsService;
use crate::catalog::{AssignmentFilter, Catalog};
use crate::error::SessionError;
use crate::sessions::{
    ExamLoopService, ExamSession, FlashcardLoopService, FlashcardSession, QuizLoopService,
    QuizSession,
};

/// Assembles the app-facing services over one storage backend.
///
/// Holds the loaded catalog; every session start is gated on it, so a
/// failed or unfinished reference-data load surfaces as
/// `SessionError::DataUnavailable` instead of a session over partial
/// data.
#[derive(Clone)]
pub struct AppServices {
    catalog: Option<Arc<Catalog>>,
    quiz_loop: Arc<QuizLoopService>,
    exam_loop: Arc<ExamLoopService>,
    flashcard_loop: Arc<FlashcardLoopService>,
    analytics: Arc<AnalyticsService>,
}

impl AppServices {
    /// Build services over the given storage; no catalog installed yet.
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage) -> Self {
        let quiz_loop = Arc::new(QuizLoopService::new(clock, Arc::clone(&storage.progress)));
        let exam_loop = Arc::new(ExamLoopService::new(clock, Arc::clone(&storage.analytics)));
        let flashcard_loop = Arc::new(FlashcardLoopService::new(
            clock,
            Arc::clone(&storage.progress),
        ));
        let analytics = Arc::new(AnalyticsService::new(
            clock,
            Arc::clone(&storage.analytics),
            Arc::clone(&storage.progress),
        ));

        Self {
            catalog: None,
            quiz_loop,
            exam_loop,
            flashcard_loop,
            analytics,
        }
    }

    /// Install the loaded reference dataset, unblocking session starts.
    pub fn install_catalog(&mut self, catalog: Catalog) {
        debug!(
            pieces = catalog.pieces().len(),
            flashcards = catalog.flashcards().len(),
            "catalog installed"
        );
        self.catalog = Some(Arc::new(catalog));
    }

    /// The installed catalog.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DataUnavailable` before a catalog is
    /// installed.
    pub fn catalog(&self) -> Result<&Arc<Catalog>, SessionError> {
        self.catalog.as_ref().ok_or(SessionError::DataUnavailable)
    }

    /// Start a quiz session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DataUnavailable` without a catalog, or
    /// `SessionError::EmptySelection` when nothing matches the filter.
    pub fn start_quiz(
        &self,
        difficulty: Difficulty,
        filter: &AssignmentFilter,
        count: usize,
    ) -> Result<QuizSession, SessionError> {
        let catalog = self.catalog()?;
        self.quiz_loop.start(catalog, difficulty, filter, count)
    }

    /// Start an exam simulation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DataUnavailable` without a catalog, or
    /// `SessionError::InsufficientPieces` when fewer than five pieces
    /// match.
    pub fn start_exam(
        &self,
        mystery_mode: bool,
        filter: &AssignmentFilter,
    ) -> Result<ExamSession, SessionError> {
        let catalog = self.catalog()?;
        self.exam_loop.start(catalog, mystery_mode, filter)
    }

    /// Build an idle flashcard session over the catalog's cards.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DataUnavailable` without a catalog.
    pub fn flashcard_session(&self) -> Result<FlashcardSession, SessionError> {
        Ok(FlashcardSession::new(self.catalog()?))
    }

    /// Readiness estimate against the installed dataset.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DataUnavailable` without a catalog and
    /// `SessionError::Storage` on repository failures.
    pub async fn readiness(&self) -> Result<ReadinessReport, SessionError> {
        let total = self.catalog()?.pieces().len();
        Ok(self.analytics.readiness(total).await?)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn exam_loop(&self) -> Arc<ExamLoopService> {
        Arc::clone(&self.exam_loop)
    }

    #[must_use]
    pub fn flashcard_loop(&self) -> Arc<FlashcardLoopService> {
        Arc::clone(&self.flashcard_loop)
    }

    #[must_use]
    pub fn analytics(&self) -> Arc<AnalyticsService> {
        Arc::clone(&self.analytics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_clock;

    fn catalog() -> Catalog {
        let shared = crate::catalog::test_support::catalog();
        (*shared).clone()
    }

    #[test]
    fn sessions_are_gated_on_the_catalog() {
        let storage = Storage::in_memory();
        let services = AppServices::new(fixed_clock(), &storage);

        assert!(matches!(
            services.start_quiz(Difficulty::Easy, &AssignmentFilter::All, 5),
            Err(SessionError::DataUnavailable)
        ));
        assert!(matches!(
            services.start_exam(false, &AssignmentFilter::All),
            Err(SessionError::DataUnavailable)
        ));
        assert!(matches!(
            services.flashcard_session(),
            Err(SessionError::DataUnavailable)
        ));
    }

    #[test]
    fn installed_catalog_unblocks_session_starts() {
        let storage = Storage::in_memory();
        let mut services = AppServices::new(fixed_clock(), &storage);
        services.install_catalog(catalog());

        let quiz = services
            .start_quiz(Difficulty::Medium, &AssignmentFilter::All, 3)
            .unwrap();
        assert_eq!(quiz.total_questions(), 3);

        let exam = services.start_exam(true, &AssignmentFilter::All).unwrap();
        assert!(exam.mystery_mode());

        let flashcards = services.flashcard_session().unwrap();
        assert_eq!(flashcards.deck_size(), 4);
    }

    #[tokio::test]
    async fn readiness_is_zero_for_a_fresh_install() {
        let storage = Storage::in_memory();
        let mut services = AppServices::new(fixed_clock(), &storage);
        services.install_catalog(catalog());

        let report = services.readiness().await.unwrap();
        assert_eq!(report.score, 0);
    }
}
