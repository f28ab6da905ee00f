use serde::Deserialize;

use quiz_core::model::{
    CharacteristicsEntry, CharacteristicsMap, Flashcard, Piece, VocabularyGlossary,
};

use crate::error::CatalogError;

/// Assignment-tag selection for quiz and exam piece pools.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssignmentFilter {
    /// Every piece in the catalog.
    #[default]
    All,
    /// Pieces from any of the listed assignment tags.
    Tags(Vec<String>),
}

impl AssignmentFilter {
    /// Parse the shell's filter value: `"all"` or a comma-separated tag list.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        Self::Tags(
            value
                .split(',')
                .map(|tag| tag.trim().to_owned())
                .filter(|tag| !tag.is_empty())
                .collect(),
        )
    }

    /// Convenience constructor for a single tag.
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tags(vec![tag.into()])
    }

    #[must_use]
    pub fn matches(&self, piece: &Piece) -> bool {
        match self {
            Self::All => true,
            Self::Tags(tags) => tags.iter().any(|tag| tag == piece.assignment()),
        }
    }
}

/// Wire shape of a catalog snapshot handed over by the data-loading shell.
#[derive(Debug, Deserialize)]
struct CatalogSnapshot {
    pieces: Vec<Piece>,
    #[serde(default)]
    flashcards: Vec<Flashcard>,
    #[serde(default)]
    characteristics: CharacteristicsMap,
    #[serde(default)]
    vocabulary: VocabularyGlossary,
}

/// The loaded reference dataset: pieces, flashcards, characteristics and
/// the vocabulary glossary.
///
/// Immutable once built; sessions borrow from it for their whole life.
#[derive(Debug, Clone)]
pub struct Catalog {
    pieces: Vec<Piece>,
    flashcards: Vec<Flashcard>,
    characteristics: CharacteristicsMap,
    vocabulary: VocabularyGlossary,
}

impl Catalog {
    /// Assemble a catalog from already-loaded reference data.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NoPieces` when the piece list is empty;
    /// sessions cannot run against an empty dataset.
    pub fn new(
        pieces: Vec<Piece>,
        flashcards: Vec<Flashcard>,
        characteristics: CharacteristicsMap,
        vocabulary: VocabularyGlossary,
    ) -> Result<Self, CatalogError> {
        if pieces.is_empty() {
            return Err(CatalogError::NoPieces);
        }
        Ok(Self {
            pieces,
            flashcards,
            characteristics,
            vocabulary,
        })
    }

    /// Parse a JSON catalog snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` on malformed JSON and
    /// `CatalogError::NoPieces` on an empty piece list.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let snapshot: CatalogSnapshot = serde_json::from_str(raw)?;
        Self::new(
            snapshot.pieces,
            snapshot.flashcards,
            snapshot.characteristics,
            snapshot.vocabulary,
        )
    }

    #[must_use]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[must_use]
    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    #[must_use]
    pub fn vocabulary(&self) -> &VocabularyGlossary {
        &self.vocabulary
    }

    /// Characteristics ground truth for a piece, when the database has it.
    #[must_use]
    pub fn characteristics_for(&self, piece: &Piece) -> Option<&CharacteristicsEntry> {
        self.characteristics.get(&piece.key())
    }

    /// Pieces matching an assignment filter, in catalog order.
    #[must_use]
    pub fn pieces_matching(&self, filter: &AssignmentFilter) -> Vec<Piece> {
        self.pieces
            .iter()
            .filter(|piece| filter.matches(piece))
            .cloned()
            .collect()
    }

    /// Distinct assignment tags, sorted.
    #[must_use]
    pub fn assignments(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .pieces
            .iter()
            .map(|piece| piece.assignment().to_owned())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Distinct flashcard topics, sorted.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .flashcards
            .iter()
            .map(|card| card.topic().to_owned())
            .collect();
        topics.sort();
        topics.dedup();
        topics
    }

    /// Distinct flashcard lecture tags, sorted.
    #[must_use]
    pub fn lectures(&self) -> Vec<String> {
        let mut lectures: Vec<String> = self
            .flashcards
            .iter()
            .map(|card| card.lecture().to_owned())
            .collect();
        lectures.sort();
        lectures.dedup();
        lectures
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::catalog;
    use super::*;

    #[test]
    fn filter_parses_all_and_tag_lists() {
        assert_eq!(AssignmentFilter::parse("all"), AssignmentFilter::All);
        assert_eq!(AssignmentFilter::parse(""), AssignmentFilter::All);
        assert_eq!(
            AssignmentFilter::parse("2a,2b"),
            AssignmentFilter::Tags(vec!["2a".to_owned(), "2b".to_owned()])
        );
    }

    #[test]
    fn pieces_matching_respects_tags() {
        let catalog = catalog();
        assert_eq!(catalog.pieces_matching(&AssignmentFilter::All).len(), 8);
        assert_eq!(
            catalog
                .pieces_matching(&AssignmentFilter::parse("2a,2b"))
                .len(),
            3
        );
        assert!(
            catalog
                .pieces_matching(&AssignmentFilter::tag("9z"))
                .is_empty()
        );
    }

    #[test]
    fn assignments_and_topics_are_sorted_and_distinct() {
        let catalog = catalog();
        assert_eq!(catalog.assignments(), ["1a", "1b", "2a", "2b", "3a", "3b"]);
        assert_eq!(
            catalog.topics(),
            ["Musical Terminology", "Organum", "Secular Song"]
        );
    }

    #[test]
    fn empty_piece_list_is_rejected() {
        let result = Catalog::new(
            Vec::new(),
            Vec::new(),
            CharacteristicsMap::new(),
            VocabularyGlossary::default(),
        );
        assert!(matches!(result, Err(CatalogError::NoPieces)));
    }

    #[test]
    fn snapshot_parses_from_json() {
        let raw = r#"{
            "pieces": [
                {
                    "assignment": "1a",
                    "composer": "Anonymous",
                    "title": "Agnus Dei",
                    "genre": "Chant",
                    "audio_ref": "audio/1a_anonymous_agnus_dei.mp3"
                }
            ],
            "flashcards": [],
            "characteristics": {
                "1a_anonymous_agnus_dei": {
                    "key_characteristics": ["monophonic texture"],
                    "period": "Medieval"
                }
            }
        }"#;

        let catalog = Catalog::from_json(raw).unwrap();
        assert_eq!(catalog.pieces().len(), 1);
        assert!(catalog.characteristics_for(&catalog.pieces()[0]).is_some());
    }
}
