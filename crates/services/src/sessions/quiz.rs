use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::sync::Arc;

use quiz_core::model::{Piece, QuizRecord};
use quiz_core::scoring::{Difficulty, FieldAnswers, GradedQuestion, grade_question};

use crate::catalog::{AssignmentFilter, Catalog};
use crate::choices::{QuestionMaterial, question_material, shuffled};
use crate::error::SessionError;
use storage::repository::RecordId;

//
// ─── ANSWER RECORDS ────────────────────────────────────────────────────────────
//

/// Feedback for one answered question: what was asked, what the learner
/// said, and how it scored.
#[derive(Debug, Clone, PartialEq)]
pub struct AnsweredQuestion {
    pub piece: Piece,
    pub user_answers: FieldAnswers,
    pub graded: GradedQuestion,
}

/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// Final summary of a completed quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizOutcome {
    pub score: f64,
    pub max_score: f64,
    pub percentage: u32,
    pub difficulty: Difficulty,
    pub question_count: usize,
    /// Questions that cleared the pass threshold.
    pub fully_correct: usize,
    /// Questions below the threshold that still earned partial points.
    pub partial_credit: usize,
}

impl QuizOutcome {
    /// Convert into the persisted record shape, stamped at `date`.
    #[must_use]
    pub fn to_record(&self, date: DateTime<Utc>) -> QuizRecord {
        QuizRecord {
            date,
            score: self.score,
            max_score: self.max_score,
            percentage: self.percentage,
            difficulty: self.difficulty,
            question_count: self.question_count,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz session over a shuffled selection of pieces.
///
/// Steps question by question: `submit_answer` grades the current piece
/// without advancing, `next` moves on and finalizes the outcome at the
/// end. Dropping the session is the reset transition.
pub struct QuizSession {
    catalog: Arc<Catalog>,
    pieces: Vec<Piece>,
    difficulty: Difficulty,
    current: usize,
    score: f64,
    max_score: f64,
    answers: Vec<AnsweredQuestion>,
    started_at: DateTime<Utc>,
    outcome: Option<QuizOutcome>,
    record_id: Option<RecordId>,
}

impl QuizSession {
    /// Start a quiz over up to `count` pieces matching the filter.
    ///
    /// Pieces are Fisher-Yates shuffled before selection so every run
    /// sees a fresh ordering.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptySelection` when the filter matches no
    /// pieces or `count` is zero.
    pub fn start(
        catalog: &Arc<Catalog>,
        difficulty: Difficulty,
        filter: &AssignmentFilter,
        count: usize,
        rng: &mut impl Rng,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let pool = catalog.pieces_matching(filter);
        let mut pieces = shuffled(&pool, rng);
        pieces.truncate(count.min(pieces.len()));

        if pieces.is_empty() {
            return Err(SessionError::EmptySelection);
        }

        Ok(Self {
            catalog: Arc::clone(catalog),
            pieces,
            difficulty,
            current: 0,
            score: 0.0,
            max_score: 0.0,
            answers: Vec::new(),
            started_at,
            outcome: None,
            record_id: None,
        })
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    #[must_use]
    pub fn answers(&self) -> &[AnsweredQuestion] {
        &self.answers
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.pieces.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&QuizOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub(crate) fn set_record_id(&mut self, id: RecordId) {
        self.record_id = Some(id);
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            total: self.pieces.len(),
            answered: self.answers.len(),
            remaining: self.pieces.len().saturating_sub(self.current),
            is_complete: self.is_complete(),
        }
    }

    /// The piece currently being asked about, if the quiz is still running.
    #[must_use]
    pub fn current_piece(&self) -> Option<&Piece> {
        if self.outcome.is_none() {
            self.pieces.get(self.current)
        } else {
            None
        }
    }

    /// Prompt material for the current question.
    ///
    /// Multiple-choice distractors draw from the whole catalog, not just
    /// the session's selection.
    pub fn question(&self, rng: &mut impl Rng) -> Option<QuestionMaterial> {
        self.current_piece().map(|piece| {
            question_material(self.catalog.pieces(), piece, self.difficulty, rng)
        })
    }

    /// Grade the current question. Does not advance.
    ///
    /// Blank answers are legal and score zero. Earned points only count
    /// toward the running score when the question passes its threshold;
    /// the maximum accumulator grows either way so the final percentage
    /// stays meaningful.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after the quiz has finished and
    /// `SessionError::AlreadyAnswered` on a duplicate submission.
    pub fn submit_answer(
        &mut self,
        user_answers: FieldAnswers,
    ) -> Result<&AnsweredQuestion, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.answers.len() > self.current {
            return Err(SessionError::AlreadyAnswered);
        }
        let Some(piece) = self.pieces.get(self.current) else {
            return Err(SessionError::Completed);
        };

        let graded = grade_question(&user_answers, piece, self.difficulty);
        if graded.is_correct {
            self.score += graded.points;
        }
        self.max_score += graded.max_points;

        self.answers.push(AnsweredQuestion {
            piece: piece.clone(),
            user_answers,
            graded,
        });

        self.answers.last().ok_or(SessionError::Completed)
    }

    /// Advance to the next question; finalizes the outcome at the end.
    ///
    /// Idempotent once the quiz is complete.
    pub fn next(&mut self) {
        if self.is_complete() {
            return;
        }

        self.current += 1;
        if self.current >= self.pieces.len() {
            self.finalize();
        }
    }

    fn finalize(&mut self) {
        let percentage = if self.max_score > 0.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pct = (self.score / self.max_score * 100.0).round() as u32;
            pct
        } else {
            0
        };

        let fully_correct = self
            .answers
            .iter()
            .filter(|answer| answer.graded.is_correct)
            .count();
        let partial_credit = self
            .answers
            .iter()
            .filter(|answer| !answer.graded.is_correct && answer.graded.points > 0.0)
            .count();

        self.outcome = Some(QuizOutcome {
            score: self.score,
            max_score: self.max_score,
            percentage,
            difficulty: self.difficulty,
            question_count: self.pieces.len(),
            fully_correct,
            partial_credit,
        });
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("difficulty", &self.difficulty)
            .field("pieces_len", &self.pieces.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("max_score", &self.max_score)
            .field("is_complete", &self.is_complete())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::catalog;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn answers_for(piece: &Piece) -> FieldAnswers {
        FieldAnswers::new(piece.title(), piece.composer(), piece.genre())
    }

    #[test]
    fn start_caps_selection_at_available_pieces() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(1);
        let session = QuizSession::start(
            &catalog,
            Difficulty::Hard,
            &AssignmentFilter::tag("1a"),
            10,
            &mut rng,
            fixed_now(),
        )
        .unwrap();

        assert_eq!(session.total_questions(), 2);
    }

    #[test]
    fn unmatched_filter_fails_to_start() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(1);
        let err = QuizSession::start(
            &catalog,
            Difficulty::Easy,
            &AssignmentFilter::tag("9z"),
            5,
            &mut rng,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::EmptySelection));
    }

    #[test]
    fn perfect_run_scores_full_marks() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = QuizSession::start(
            &catalog,
            Difficulty::Hard,
            &AssignmentFilter::All,
            3,
            &mut rng,
            fixed_now(),
        )
        .unwrap();

        while let Some(piece) = session.current_piece().cloned() {
            let feedback = session.submit_answer(answers_for(&piece)).unwrap();
            assert!(feedback.graded.is_correct);
            session.next();
        }

        let outcome = session.outcome().unwrap();
        assert_eq!(outcome.percentage, 100);
        assert_eq!(outcome.fully_correct, 3);
        assert!((outcome.max_score - 6.0).abs() < 1e-9);
        assert!((outcome.score - 6.0).abs() < 1e-9);
    }

    #[test]
    fn score_never_exceeds_max_score() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = QuizSession::start(
            &catalog,
            Difficulty::Medium,
            &AssignmentFilter::All,
            4,
            &mut rng,
            fixed_now(),
        )
        .unwrap();

        let answer_sets = [
            FieldAnswers::default(),
            FieldAnswers::new("Sanctus", "", ""),
            FieldAnswers::new("wrong", "wrong", "wrong"),
            FieldAnswers::new("Fair Phyllis", "John farmer", "Madrigal"),
        ];

        for answers in answer_sets {
            session.submit_answer(answers).unwrap();
            assert!(session.score() <= session.max_score() + 1e-9);
            session.next();
        }

        let outcome = session.outcome().unwrap();
        // Max accumulates the multiplier once per answered question.
        assert!((outcome.max_score - 4.0 * 1.5).abs() < 1e-9);
        assert!(outcome.percentage <= 100);
    }

    #[test]
    fn double_submission_is_rejected() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = QuizSession::start(
            &catalog,
            Difficulty::Hard,
            &AssignmentFilter::All,
            2,
            &mut rng,
            fixed_now(),
        )
        .unwrap();

        session.submit_answer(FieldAnswers::default()).unwrap();
        let err = session.submit_answer(FieldAnswers::default()).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyAnswered));
    }

    #[test]
    fn next_is_idempotent_after_completion() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = QuizSession::start(
            &catalog,
            Difficulty::Easy,
            &AssignmentFilter::All,
            1,
            &mut rng,
            fixed_now(),
        )
        .unwrap();

        session.submit_answer(FieldAnswers::default()).unwrap();
        session.next();
        assert!(session.is_complete());

        let outcome_before = session.outcome().cloned();
        session.next();
        session.next();
        assert_eq!(session.outcome().cloned(), outcome_before);

        let err = session.submit_answer(FieldAnswers::default()).unwrap_err();
        assert!(matches!(err, SessionError::Completed));
    }

    #[test]
    fn easy_questions_come_with_choice_sets() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(8);
        let mut session = QuizSession::start(
            &catalog,
            Difficulty::Easy,
            &AssignmentFilter::All,
            2,
            &mut rng,
            fixed_now(),
        )
        .unwrap();

        let piece = session.current_piece().cloned().unwrap();
        match session.question(&mut rng).unwrap() {
            crate::choices::QuestionMaterial::MultipleChoice { title, .. } => {
                assert_eq!(title.options.len(), 4);
                assert!(title.options.contains(&piece.title().to_owned()));
            }
            other => panic!("expected multiple choice, got {other:?}"),
        }

        let progress = session.progress();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.answered, 0);
        assert_eq!(progress.remaining, 2);

        session.submit_answer(FieldAnswers::default()).unwrap();
        session.next();
        assert_eq!(session.progress().answered, 1);
        assert_eq!(session.progress().remaining, 1);
    }

    #[test]
    fn skipping_a_question_still_counts_toward_max() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(6);
        let mut session = QuizSession::start(
            &catalog,
            Difficulty::Hard,
            &AssignmentFilter::All,
            2,
            &mut rng,
            fixed_now(),
        )
        .unwrap();

        // Answer the first question, skip the second entirely.
        let piece = session.current_piece().cloned().unwrap();
        session.submit_answer(answers_for(&piece)).unwrap();
        session.next();
        session.next();

        let outcome = session.outcome().unwrap();
        assert!(session.is_complete());
        // Only the answered question accumulated max points.
        assert!((outcome.max_score - 2.0).abs() < 1e-9);
        assert_eq!(outcome.percentage, 100);
    }
}
