use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PieceError {
    #[error("piece is missing a {0} value")]
    MissingField(&'static str),
}

/// The three graded identification fields of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuizField {
    Title,
    Composer,
    Genre,
}

impl QuizField {
    pub const ALL: [QuizField; 3] = [QuizField::Title, QuizField::Composer, QuizField::Genre];
}

impl fmt::Display for QuizField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuizField::Title => "title",
            QuizField::Composer => "composer",
            QuizField::Genre => "genre",
        };
        write!(f, "{label}")
    }
}

/// Key linking a piece to its characteristics entry and analytics rows.
///
/// Derived from the piece's audio reference with the `audio/` directory
/// prefix and `.mp3` extension stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceKey(String);

impl PieceKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the key from an audio reference.
    #[must_use]
    pub fn from_audio_ref(audio_ref: &str) -> Self {
        let trimmed = audio_ref.strip_prefix("audio/").unwrap_or(audio_ref);
        let trimmed = trimmed.strip_suffix(".mp3").unwrap_or(trimmed);
        Self(trimmed.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PieceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single historical music work in the reference dataset.
///
/// Immutable once loaded; identity is the audio reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    assignment: String,
    composer: String,
    title: String,
    genre: String,
    audio_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external_media_url: Option<String>,
}

impl Piece {
    /// Build a piece, validating that all graded fields are present.
    ///
    /// # Errors
    ///
    /// Returns `PieceError::MissingField` when a required field is empty.
    pub fn new(
        assignment: impl Into<String>,
        composer: impl Into<String>,
        title: impl Into<String>,
        genre: impl Into<String>,
        audio_ref: impl Into<String>,
        external_media_url: Option<String>,
    ) -> Result<Self, PieceError> {
        let piece = Self {
            assignment: assignment.into(),
            composer: composer.into(),
            title: title.into(),
            genre: genre.into(),
            audio_ref: audio_ref.into(),
            external_media_url,
        };

        if piece.assignment.trim().is_empty() {
            return Err(PieceError::MissingField("assignment"));
        }
        if piece.composer.trim().is_empty() {
            return Err(PieceError::MissingField("composer"));
        }
        if piece.title.trim().is_empty() {
            return Err(PieceError::MissingField("title"));
        }
        if piece.genre.trim().is_empty() {
            return Err(PieceError::MissingField("genre"));
        }
        if piece.audio_ref.trim().is_empty() {
            return Err(PieceError::MissingField("audio_ref"));
        }

        Ok(piece)
    }

    #[must_use]
    pub fn assignment(&self) -> &str {
        &self.assignment
    }

    #[must_use]
    pub fn composer(&self) -> &str {
        &self.composer
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn genre(&self) -> &str {
        &self.genre
    }

    #[must_use]
    pub fn audio_ref(&self) -> &str {
        &self.audio_ref
    }

    #[must_use]
    pub fn external_media_url(&self) -> Option<&str> {
        self.external_media_url.as_deref()
    }

    /// Key into the characteristics database and analytics maps.
    #[must_use]
    pub fn key(&self) -> PieceKey {
        PieceKey::from_audio_ref(&self.audio_ref)
    }

    /// Reference value for a graded field.
    #[must_use]
    pub fn field(&self, field: QuizField) -> &str {
        match field {
            QuizField::Title => &self.title,
            QuizField::Composer => &self.composer,
            QuizField::Genre => &self.genre,
        }
    }
}
