use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::sync::Arc;

use quiz_core::analysis::{ExamAnswers, analysis_points, identification_points};
use quiz_core::model::{ExamAnswerSummary, ExamRecord, Piece};

use crate::catalog::{AssignmentFilter, Catalog};
use crate::choices::shuffled;
use crate::error::SessionError;

/// Pieces per exam simulation.
pub const EXAM_PIECE_COUNT: usize = 5;
/// Countdown length in seconds (30 minutes).
pub const EXAM_DURATION_SECONDS: u32 = 30 * 60;
/// Maximum exam score: 3 identification + 2 analysis points per piece.
pub const EXAM_MAX_SCORE: u32 = 25;

//
// ─── ANSWERS AND OUTCOME ───────────────────────────────────────────────────────
//

/// Scored answer for one exam piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamAnsweredPiece {
    pub piece: Piece,
    pub user_answers: ExamAnswers,
    /// Identification points, 0 through 3.
    pub identification: u8,
    /// Analysis points, 0 through 2.
    pub analysis: u8,
}

impl ExamAnsweredPiece {
    /// Combined points for this piece, out of 5.
    #[must_use]
    pub fn total_points(&self) -> u8 {
        self.identification + self.analysis
    }

    fn summary(&self) -> ExamAnswerSummary {
        ExamAnswerSummary {
            piece_key: self.piece.key(),
            title: self.piece.title().to_owned(),
            composer: self.piece.composer().to_owned(),
            genre: self.piece.genre().to_owned(),
            identification: self.identification,
            analysis: self.analysis,
        }
    }
}

/// Rule-based study advice generated when an exam ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    /// Drill composer names and piece titles.
    DrillIdentification,
    /// Run flashcard sessions for identification practice.
    PracticeFlashcards,
    /// Study musical characteristics and vocabulary.
    StudyVocabulary,
    /// Practice describing what is heard in technical terms.
    DescribeTechnically,
    /// Revisit the named pieces.
    ReviewPieces(Vec<String>),
}

/// Final summary of an exam simulation.
///
/// Sums cover answered pieces only; the maximum stays fixed at 25 so a
/// timed-out partial exam reads as the low score it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamOutcome {
    pub total_score: u32,
    pub identification_score: u32,
    pub analysis_score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub time_used_seconds: u32,
    pub recommendations: Vec<Recommendation>,
    pub answers: Vec<ExamAnswerSummary>,
}

impl ExamOutcome {
    /// Convert into the persisted record shape, stamped at `date`.
    #[must_use]
    pub fn to_record(&self, date: DateTime<Utc>) -> ExamRecord {
        ExamRecord {
            date,
            total_score: self.total_score,
            max_score: self.max_score,
            percentage: self.percentage,
            identification_score: self.identification_score,
            analysis_score: self.analysis_score,
            time_used_seconds: self.time_used_seconds,
            answers: self.answers.clone(),
        }
    }
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is no longer active; the tick was ignored.
    Idle,
    /// Time remains.
    Running { remaining_seconds: u32 },
    /// The countdown hit zero and the exam was force-ended.
    Expired,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Timed five-piece exam simulation.
///
/// Driven by discrete commands: a 1-second `tick` from the shell's timer,
/// `submit_answer`/`next` from the form, and `end` for early hand-in.
/// Every terminal path goes through `end`, after which ticks are ignored,
/// so a stale timer can never mutate a finished session.
pub struct ExamSession {
    catalog: Arc<Catalog>,
    pieces: Vec<Piece>,
    mystery_mode: bool,
    current: usize,
    started_at: DateTime<Utc>,
    remaining_seconds: u32,
    revealed: bool,
    answers: Vec<ExamAnsweredPiece>,
    outcome: Option<ExamOutcome>,
    record_id: Option<storage::repository::RecordId>,
}

impl ExamSession {
    /// Start an exam over exactly five pieces matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientPieces` when fewer than five
    /// pieces match; no session state is created in that case.
    pub fn start(
        catalog: &Arc<Catalog>,
        mystery_mode: bool,
        filter: &AssignmentFilter,
        rng: &mut impl Rng,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let pool = catalog.pieces_matching(filter);
        if pool.len() < EXAM_PIECE_COUNT {
            return Err(SessionError::InsufficientPieces {
                available: pool.len(),
            });
        }

        let mut pieces = shuffled(&pool, rng);
        pieces.truncate(EXAM_PIECE_COUNT);

        Ok(Self {
            catalog: Arc::clone(catalog),
            pieces,
            mystery_mode,
            current: 0,
            started_at,
            remaining_seconds: EXAM_DURATION_SECONDS,
            revealed: false,
            answers: Vec::new(),
            outcome: None,
            record_id: None,
        })
    }

    #[must_use]
    pub fn mystery_mode(&self) -> bool {
        self.mystery_mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn current_number(&self) -> usize {
        self.current + 1
    }

    #[must_use]
    pub fn answers(&self) -> &[ExamAnsweredPiece] {
        &self.answers
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&ExamOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn record_id(&self) -> Option<storage::repository::RecordId> {
        self.record_id
    }

    pub(crate) fn set_record_id(&mut self, id: storage::repository::RecordId) {
        self.record_id = Some(id);
    }

    /// The identity of the current piece, when the learner may see it.
    ///
    /// Mystery mode withholds it until `reveal` or until the piece has
    /// been answered (feedback always shows the truth).
    #[must_use]
    pub fn current_piece_identity(&self) -> Option<&Piece> {
        if self.is_complete() {
            return None;
        }
        if self.mystery_mode && !self.revealed && self.answers.len() <= self.current {
            return None;
        }
        self.pieces.get(self.current)
    }

    /// Disclose the current piece in mystery mode. Scoring is unaffected.
    pub fn reveal(&mut self) {
        if !self.is_complete() {
            self.revealed = true;
        }
    }

    /// Drive the countdown by one second.
    ///
    /// Ticks arriving after any terminal transition are ignored, which is
    /// what makes a raced timer harmless. Hitting zero force-ends the
    /// exam; whatever was answered is scored as-is.
    pub fn tick(&mut self) -> TickOutcome {
        if self.is_complete() {
            return TickOutcome::Idle;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.end();
            return TickOutcome::Expired;
        }
        TickOutcome::Running {
            remaining_seconds: self.remaining_seconds,
        }
    }

    /// Grade the current piece. Does not advance.
    ///
    /// Identification earns one point per field clearing the 0.8 fuzzy
    /// bar; the characteristics analysis earns up to two points against
    /// the piece's reference entry. Blank answers are legal misses.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after the exam has ended and
    /// `SessionError::AlreadyAnswered` on a duplicate submission.
    pub fn submit_answer(
        &mut self,
        user_answers: ExamAnswers,
    ) -> Result<&ExamAnsweredPiece, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.answers.len() > self.current {
            return Err(SessionError::AlreadyAnswered);
        }
        let Some(piece) = self.pieces.get(self.current) else {
            return Err(SessionError::Completed);
        };

        let identification = identification_points(&user_answers, piece);
        let analysis = analysis_points(
            &user_answers.characteristics,
            self.catalog.characteristics_for(piece),
            self.catalog.vocabulary(),
        );

        self.answers.push(ExamAnsweredPiece {
            piece: piece.clone(),
            user_answers,
            identification,
            analysis,
        });

        self.answers.last().ok_or(SessionError::Completed)
    }

    /// Advance to the next piece; the fifth `next` ends the exam.
    ///
    /// Idempotent once the exam is complete.
    pub fn next(&mut self) {
        if self.is_complete() {
            return;
        }

        self.current += 1;
        self.revealed = false;
        if self.current >= self.pieces.len() {
            self.end();
        }
    }

    /// End the exam now, scoring answered pieces only.
    ///
    /// Called by the final `next`, by timer expiry, and by an early
    /// hand-in. Idempotent.
    pub fn end(&mut self) {
        if self.is_complete() {
            return;
        }

        let identification_score: u32 = self
            .answers
            .iter()
            .map(|answer| u32::from(answer.identification))
            .sum();
        let analysis_score: u32 = self
            .answers
            .iter()
            .map(|answer| u32::from(answer.analysis))
            .sum();
        let total_score = identification_score + analysis_score;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percentage =
            (f64::from(total_score) / f64::from(EXAM_MAX_SCORE) * 100.0).round() as u32;

        self.outcome = Some(ExamOutcome {
            total_score,
            identification_score,
            analysis_score,
            max_score: EXAM_MAX_SCORE,
            percentage,
            time_used_seconds: EXAM_DURATION_SECONDS - self.remaining_seconds,
            recommendations: self.recommendations(),
            answers: self.answers.iter().map(ExamAnsweredPiece::summary).collect(),
        });
    }

    fn recommendations(&self) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        let weak_identification = self
            .answers
            .iter()
            .filter(|answer| answer.identification < 2)
            .count();
        if weak_identification > 2 {
            recommendations.push(Recommendation::DrillIdentification);
            recommendations.push(Recommendation::PracticeFlashcards);
        }

        let weak_analysis = self
            .answers
            .iter()
            .filter(|answer| answer.analysis < 1)
            .count();
        if weak_analysis > 2 {
            recommendations.push(Recommendation::StudyVocabulary);
            recommendations.push(Recommendation::DescribeTechnically);
        }

        let weak_pieces: Vec<String> = self
            .answers
            .iter()
            .filter(|answer| answer.total_points() < 3)
            .map(|answer| answer.piece.title().to_owned())
            .collect();
        if !weak_pieces.is_empty() {
            recommendations.push(Recommendation::ReviewPieces(weak_pieces));
        }

        recommendations
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("mystery_mode", &self.mystery_mode)
            .field("current", &self.current)
            .field("remaining_seconds", &self.remaining_seconds)
            .field("answered", &self.answers.len())
            .field("is_complete", &self.is_complete())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
