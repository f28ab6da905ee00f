use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

use quiz_core::model::{AnswerDetail, Flashcard, FlashcardRecord};

use crate::catalog::Catalog;
use crate::error::SessionError;
use storage::repository::RecordId;

/// Repeated flip triggers inside this window are treated as one gesture.
const FLIP_DEBOUNCE_MS: i64 = 100;

/// Lifecycle of a flashcard run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
    Complete,
}

/// Presentation state of the current card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardFace {
    #[default]
    Front,
    Flipped,
    Answered,
}

/// Final summary of a completed flashcard run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashcardOutcome {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub accuracy: u32,
}

impl FlashcardOutcome {
    /// Convert into the persisted record shape, stamped at `date`.
    #[must_use]
    pub fn to_record(&self, date: DateTime<Utc>) -> FlashcardRecord {
        FlashcardRecord {
            date,
            total: self.total,
            correct: self.correct,
            incorrect: self.incorrect,
            accuracy: self.accuracy,
        }
    }
}

/// Flashcard review session over a filtered deck.
///
/// The deck is recomputed from lecture/topic filters while idle and
/// shuffled only on demand. An active run steps each card through
/// front, flipped and answered, tallying self-graded responses.
pub struct FlashcardSession {
    all_cards: Vec<Flashcard>,
    deck: Vec<Flashcard>,
    lecture_filter: Option<String>,
    topic_filter: Option<String>,
    phase: SessionPhase,
    current: usize,
    face: CardFace,
    correct: u32,
    incorrect: u32,
    last_flip_at: Option<DateTime<Utc>>,
    outcome: Option<FlashcardOutcome>,
    record_id: Option<RecordId>,
}

impl FlashcardSession {
    /// Build an idle session holding the catalog's full card list.
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        let all_cards = catalog.flashcards().to_vec();
        let deck = all_cards.clone();
        Self {
            all_cards,
            deck,
            lecture_filter: None,
            topic_filter: None,
            phase: SessionPhase::Idle,
            current: 0,
            face: CardFace::Front,
            correct: 0,
            incorrect: 0,
            last_flip_at: None,
            outcome: None,
            record_id: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn deck_size(&self) -> usize {
        self.deck.len()
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn face(&self) -> CardFace {
        self.face
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&FlashcardOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub(crate) fn set_record_id(&mut self, id: RecordId) {
        self.record_id = Some(id);
    }

    /// One-based position of the current card, for display.
    #[must_use]
    pub fn current_number(&self) -> usize {
        self.current + 1
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&Flashcard> {
        if self.phase == SessionPhase::Active {
            self.deck.get(self.current)
        } else {
            None
        }
    }

    /// Answer text of the current card at the requested detail level.
    #[must_use]
    pub fn current_answer(&self, detail: AnswerDetail) -> Option<&str> {
        self.current_card().map(|card| card.answer(detail))
    }

    /// Recompute the deck from lecture/topic filters.
    ///
    /// Returns the new deck size. `None` means "all".
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionActive` while a run is in progress;
    /// the deck under a live session never changes.
    pub fn set_filters(
        &mut self,
        lecture: Option<&str>,
        topic: Option<&str>,
    ) -> Result<usize, SessionError> {
        if self.phase == SessionPhase::Active {
            return Err(SessionError::SessionActive);
        }

        let lecture_filter = lecture.map(str::to_owned);
        let topic_filter = topic.map(str::to_owned);
        let deck: Vec<Flashcard> = self
            .all_cards
            .iter()
            .filter(|card| {
                lecture_filter
                    .as_deref()
                    .is_none_or(|lecture| card.lecture() == lecture)
            })
            .filter(|card| {
                topic_filter
                    .as_deref()
                    .is_none_or(|topic| card.topic() == topic)
            })
            .cloned()
            .collect();

        self.lecture_filter = lecture_filter;
        self.topic_filter = topic_filter;
        self.deck = deck;
        self.current = 0;

        Ok(self.deck.len())
    }

    /// Shuffle the deck in place. On demand only, never automatic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionActive` while a run is in progress.
    pub fn shuffle(&mut self, rng: &mut impl Rng) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Active {
            return Err(SessionError::SessionActive);
        }
        self.deck.shuffle(rng);
        self.current = 0;
        Ok(())
    }

    /// Begin (or restart) a run over the current deck.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyDeck` when the filters match nothing.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.deck.is_empty() {
            return Err(SessionError::EmptyDeck);
        }

        self.phase = SessionPhase::Active;
        self.current = 0;
        self.face = CardFace::Front;
        self.correct = 0;
        self.incorrect = 0;
        self.last_flip_at = None;
        self.outcome = None;
        self.record_id = None;
        Ok(())
    }

    /// Turn the current card over.
    ///
    /// Returns true when the card flipped. Repeat triggers while already
    /// flipped, and duplicates arriving within 100 ms (a double-fired
    /// gesture), are ignored.
    pub fn flip(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != SessionPhase::Active || self.face != CardFace::Front {
            return false;
        }
        if let Some(last) = self.last_flip_at {
            if now - last < Duration::milliseconds(FLIP_DEBOUNCE_MS) {
                return false;
            }
        }

        self.last_flip_at = Some(now);
        self.face = CardFace::Flipped;
        true
    }

    /// Self-grade the flipped card. Does not advance.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` outside an active run and
    /// `SessionError::NotFlipped` when the card has not been turned over.
    pub fn respond(&mut self, is_correct: bool) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Active {
            return Err(SessionError::Completed);
        }
        if self.face != CardFace::Flipped {
            return Err(SessionError::NotFlipped);
        }

        if is_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        self.face = CardFace::Answered;
        Ok(())
    }

    /// Advance to the next card, front side up; completes at deck end.
    ///
    /// Idempotent outside an active run.
    pub fn next(&mut self) {
        if self.phase != SessionPhase::Active {
            return;
        }

        self.current += 1;
        self.face = CardFace::Front;
        if self.current >= self.deck.len() {
            self.finalize();
        }
    }

    /// Abandon or acknowledge the run and return to idle.
    ///
    /// The filtered deck and its current order are preserved.
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.current = 0;
        self.face = CardFace::Front;
        self.correct = 0;
        self.incorrect = 0;
        self.last_flip_at = None;
        self.outcome = None;
        self.record_id = None;
    }

    fn finalize(&mut self) {
        let total = self.correct + self.incorrect;
        let accuracy = if total > 0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pct = (f64::from(self.correct) / f64::from(total) * 100.0).round() as u32;
            pct
        } else {
            0
        };

        self.phase = SessionPhase::Complete;
        self.outcome = Some(FlashcardOutcome {
            total,
            correct: self.correct,
            incorrect: self.incorrect,
            accuracy,
        });
    }
}

impl fmt::Debug for FlashcardSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashcardSession")
            .field("phase", &self.phase)
            .field("deck_len", &self.deck.len())
            .field("current", &self.current)
            .field("face", &self.face)
            .field("correct", &self.correct)
            .field("incorrect", &self.incorrect)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
