use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use quiz_core::Clock;
use quiz_core::scoring::Difficulty;
use storage::repository::{AnalyticsRepository, ProgressRepository, RecordId};

use crate::catalog::{AssignmentFilter, Catalog};
use crate::error::SessionError;
use super::exam::{ExamSession, TickOutcome};
use super::flashcards::{FlashcardSession, SessionPhase};
use super::quiz::QuizSession;

/// Result of advancing a quiz or flashcard session one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    pub is_complete: bool,
    /// Set once the completion record has been persisted.
    pub record_id: Option<RecordId>,
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Orchestrates quiz session start and persisted completion.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    /// Start a new quiz session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptySelection` when no pieces match.
    pub fn start(
        &self,
        catalog: &Arc<Catalog>,
        difficulty: Difficulty,
        filter: &AssignmentFilter,
        count: usize,
    ) -> Result<QuizSession, SessionError> {
        let mut rng = rand::rng();
        self.start_with_rng(catalog, difficulty, filter, count, &mut rng)
    }

    /// Start with a caller-provided RNG, for deterministic tests.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptySelection` when no pieces match.
    pub fn start_with_rng(
        &self,
        catalog: &Arc<Catalog>,
        difficulty: Difficulty,
        filter: &AssignmentFilter,
        count: usize,
        rng: &mut impl Rng,
    ) -> Result<QuizSession, SessionError> {
        let session = QuizSession::start(catalog, difficulty, filter, count, rng, self.clock.now())?;
        debug!(
            difficulty = %difficulty,
            questions = session.total_questions(),
            "quiz session started"
        );
        Ok(session)
    }

    /// Advance the session and persist its record on completion.
    ///
    /// The record is appended exactly once; advancing a finished session
    /// again returns the same id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the append fails; the session
    /// stays complete and a retry will persist it.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<StepResult, SessionError> {
        session.next();

        if let Some(outcome) = session.outcome() {
            if session.record_id().is_none() {
                let record = outcome.to_record(self.clock.now());
                let percentage = outcome.percentage;
                let id = self.progress.append_quiz(&record).await?;
                session.set_record_id(id);
                debug!(percentage, "quiz record persisted");
            }
        }

        Ok(StepResult {
            is_complete: session.is_complete(),
            record_id: session.record_id(),
        })
    }
}

//
// ─── EXAM ──────────────────────────────────────────────────────────────────────
//

/// Orchestrates exam simulations against the analytics log.
#[derive(Clone)]
pub struct ExamLoopService {
    clock: Clock,
    analytics: Arc<dyn AnalyticsRepository>,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(clock: Clock, analytics: Arc<dyn AnalyticsRepository>) -> Self {
        Self { clock, analytics }
    }

    /// Start a new exam simulation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientPieces` when fewer than five
    /// pieces match the filter.
    pub fn start(
        &self,
        catalog: &Arc<Catalog>,
        mystery_mode: bool,
        filter: &AssignmentFilter,
    ) -> Result<ExamSession, SessionError> {
        let mut rng = rand::rng();
        self.start_with_rng(catalog, mystery_mode, filter, &mut rng)
    }

    /// Start with a caller-provided RNG, for deterministic tests.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientPieces` when fewer than five
    /// pieces match the filter.
    pub fn start_with_rng(
        &self,
        catalog: &Arc<Catalog>,
        mystery_mode: bool,
        filter: &AssignmentFilter,
        rng: &mut impl Rng,
    ) -> Result<ExamSession, SessionError> {
        let session = ExamSession::start(catalog, mystery_mode, filter, rng, self.clock.now())?;
        debug!(mystery_mode, "exam simulation started");
        Ok(session)
    }

    /// Advance the session and persist its result when it ends.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when persistence fails.
    pub async fn advance(&self, session: &mut ExamSession) -> Result<StepResult, SessionError> {
        session.next();
        self.finalize(session).await
    }

    /// Drive the countdown by one second, persisting on expiry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when persistence fails.
    pub async fn tick(&self, session: &mut ExamSession) -> Result<TickOutcome, SessionError> {
        let outcome = session.tick();
        if outcome == TickOutcome::Expired {
            self.finalize(session).await?;
        }
        Ok(outcome)
    }

    /// Hand the exam in early and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when persistence fails.
    pub async fn end_now(&self, session: &mut ExamSession) -> Result<StepResult, SessionError> {
        session.end();
        self.finalize(session).await
    }

    /// Persist a completed exam into the analytics log, exactly once.
    async fn finalize(&self, session: &mut ExamSession) -> Result<StepResult, SessionError> {
        if let Some(outcome) = session.outcome() {
            if session.record_id().is_none() {
                let record = outcome.to_record(self.clock.now());
                let total_score = outcome.total_score;
                let percentage = outcome.percentage;
                let mut analytics = self.analytics.load_analytics().await?;
                analytics.exam_results.push(record);
                self.analytics.store_analytics(&analytics).await?;
                let id = analytics.exam_results.len() as RecordId;
                session.set_record_id(id);
                debug!(
                    total_score,
                    percentage,
                    "exam result persisted"
                );
            }
        }

        Ok(StepResult {
            is_complete: session.is_complete(),
            record_id: session.record_id(),
        })
    }
}

//
// ─── FLASHCARDS ────────────────────────────────────────────────────────────────
//

/// Orchestrates flashcard runs and persisted summaries.
#[derive(Clone)]
pub struct FlashcardLoopService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl FlashcardLoopService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    /// Advance the session and persist its summary on completion.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the append fails.
    pub async fn advance(
        &self,
        session: &mut FlashcardSession,
    ) -> Result<StepResult, SessionError> {
        session.next();

        if session.phase() == SessionPhase::Complete {
            if let Some(outcome) = session.outcome() {
                if session.record_id().is_none() {
                    let record = outcome.to_record(self.clock.now());
                    let accuracy = outcome.accuracy;
                    let id = self.progress.append_flashcard(&record).await?;
                    session.set_record_id(id);
                    debug!(accuracy, "flashcard summary persisted");
                }
            }
        }

        Ok(StepResult {
            is_complete: session.phase() == SessionPhase::Complete,
            record_id: session.record_id(),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::catalog;
    use crate::sessions::exam::EXAM_DURATION_SECONDS;
    use quiz_core::analysis::ExamAnswers;
    use quiz_core::scoring::FieldAnswers;
    use quiz_core::time::fixed_clock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn quiz_completion_persists_exactly_one_record() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = QuizLoopService::new(fixed_clock(), repo.clone());
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(21);

        let mut session = service
            .start_with_rng(&catalog, Difficulty::Hard, &AssignmentFilter::All, 2, &mut rng)
            .unwrap();

        session.submit_answer(FieldAnswers::default()).unwrap();
        let step = service.advance(&mut session).await.unwrap();
        assert!(!step.is_complete);

        session.submit_answer(FieldAnswers::default()).unwrap();
        let step = service.advance(&mut session).await.unwrap();
        assert!(step.is_complete);
        let first_id = step.record_id.unwrap();

        // Advancing a finished session must not duplicate the record.
        let step = service.advance(&mut session).await.unwrap();
        assert_eq!(step.record_id, Some(first_id));
        assert_eq!(repo.list_quizzes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn exam_expiry_persists_to_analytics() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ExamLoopService::new(fixed_clock(), repo.clone());
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(22);

        let mut session = service
            .start_with_rng(&catalog, false, &AssignmentFilter::All, &mut rng)
            .unwrap();
        session.submit_answer(ExamAnswers::default()).unwrap();

        let mut last = TickOutcome::Idle;
        for _ in 0..EXAM_DURATION_SECONDS {
            last = service.tick(&mut session).await.unwrap();
        }
        assert_eq!(last, TickOutcome::Expired);

        let analytics = repo.load_analytics().await.unwrap();
        assert_eq!(analytics.exam_results.len(), 1);
        assert_eq!(analytics.exam_results[0].answers.len(), 1);

        // Stale ticks stay inert and persist nothing further.
        assert_eq!(service.tick(&mut session).await.unwrap(), TickOutcome::Idle);
        assert_eq!(repo.load_analytics().await.unwrap().exam_results.len(), 1);
    }

    #[tokio::test]
    async fn early_hand_in_persists_once() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ExamLoopService::new(fixed_clock(), repo.clone());
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(23);

        let mut session = service
            .start_with_rng(&catalog, false, &AssignmentFilter::All, &mut rng)
            .unwrap();

        let step = service.end_now(&mut session).await.unwrap();
        assert!(step.is_complete);
        let step_again = service.end_now(&mut session).await.unwrap();
        assert_eq!(step_again.record_id, step.record_id);
        assert_eq!(repo.load_analytics().await.unwrap().exam_results.len(), 1);
    }

    #[tokio::test]
    async fn flashcard_completion_persists_summary() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = FlashcardLoopService::new(fixed_clock(), repo.clone());
        let catalog = catalog();

        let mut session = FlashcardSession::new(&catalog);
        session.start().unwrap();

        let mut now = quiz_core::time::fixed_now();
        for _ in 0..session.deck_size() {
            assert!(session.flip(now));
            session.respond(true).unwrap();
            service.advance(&mut session).await.unwrap();
            now += chrono::Duration::seconds(1);
        }

        assert_eq!(session.phase(), SessionPhase::Complete);
        let records = repo.list_flashcards().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].accuracy, 100);
    }
}
