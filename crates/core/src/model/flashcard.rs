use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlashcardError {
    #[error("flashcard {id} is missing a {field} value")]
    MissingField { id: FlashcardId, field: &'static str },
}

/// Unique identifier for a Flashcard
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlashcardId(u32);

impl FlashcardId {
    /// Creates a new `FlashcardId`
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FlashcardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlashcardId({})", self.0)
    }
}

impl fmt::Display for FlashcardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which rendition of a card's answer the learner wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerDetail {
    /// The full lecture-level answer.
    #[default]
    Full,
    /// The simplified answer, when the card provides one.
    Simple,
}

/// A study flashcard: a question front and one or two answer backs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    id: FlashcardId,
    lecture: String,
    topic: String,
    front: String,
    back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    back_simple: Option<String>,
}

impl Flashcard {
    /// Build a flashcard, validating the question and answer texts.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError::MissingField` when front, back, lecture or
    /// topic is empty.
    pub fn new(
        id: FlashcardId,
        lecture: impl Into<String>,
        topic: impl Into<String>,
        front: impl Into<String>,
        back: impl Into<String>,
        back_simple: Option<String>,
    ) -> Result<Self, FlashcardError> {
        let card = Self {
            id,
            lecture: lecture.into(),
            topic: topic.into(),
            front: front.into(),
            back: back.into(),
            back_simple,
        };

        for (field, value) in [
            ("lecture", &card.lecture),
            ("topic", &card.topic),
            ("front", &card.front),
            ("back", &card.back),
        ] {
            if value.trim().is_empty() {
                return Err(FlashcardError::MissingField { id, field });
            }
        }

        Ok(card)
    }

    #[must_use]
    pub fn id(&self) -> FlashcardId {
        self.id
    }

    #[must_use]
    pub fn lecture(&self) -> &str {
        &self.lecture
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn front(&self) -> &str {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &str {
        &self.back
    }

    #[must_use]
    pub fn back_simple(&self) -> Option<&str> {
        self.back_simple.as_deref()
    }

    /// Answer text at the requested detail level.
    ///
    /// Falls back to the full answer when no simplified version exists.
    #[must_use]
    pub fn answer(&self, detail: AnswerDetail) -> &str {
        match detail {
            AnswerDetail::Simple => self.back_simple.as_deref().unwrap_or(&self.back),
            AnswerDetail::Full => &self.back,
        }
    }
}
