use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::PieceKey;

/// Ground-truth listening characteristics for one piece.
///
/// The phrase list is ordered as presented in course materials and is the
/// reference against which free-text analysis answers are graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicsEntry {
    key_characteristics: Vec<String>,
    #[serde(default)]
    period: String,
}

impl CharacteristicsEntry {
    #[must_use]
    pub fn new(key_characteristics: Vec<String>, period: impl Into<String>) -> Self {
        Self {
            key_characteristics,
            period: period.into(),
        }
    }

    #[must_use]
    pub fn key_characteristics(&self) -> &[String] {
        &self.key_characteristics
    }

    /// Historical period label (e.g. "Medieval"), used by reference views.
    #[must_use]
    pub fn period(&self) -> &str {
        &self.period
    }
}

/// Map from piece key to its characteristics entry.
pub type CharacteristicsMap = BTreeMap<PieceKey, CharacteristicsEntry>;

/// Domain vocabulary glossary: category -> term -> definition.
///
/// Terms double as the bonus wordlist for analysis grading; definitions
/// feed the (out-of-scope) reference chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VocabularyGlossary {
    categories: BTreeMap<String, BTreeMap<String, String>>,
}

impl VocabularyGlossary {
    #[must_use]
    pub fn new(categories: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { categories }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(BTreeMap::is_empty)
    }

    /// All known terms across every category.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.categories
            .values()
            .flat_map(|category| category.keys().map(String::as_str))
    }

    /// Definition lookup across categories; first match wins.
    #[must_use]
    pub fn definition(&self, term: &str) -> Option<&str> {
        self.categories
            .values()
            .find_map(|category| category.get(term).map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glossary() -> VocabularyGlossary {
        let mut texture = BTreeMap::new();
        texture.insert(
            "monophonic".to_owned(),
            "Single melodic line without accompaniment".to_owned(),
        );
        texture.insert(
            "polyphonic".to_owned(),
            "Multiple independent melodic lines".to_owned(),
        );
        let mut rhythm = BTreeMap::new();
        rhythm.insert(
            "free rhythm".to_owned(),
            "Unmeasured, following natural speech patterns".to_owned(),
        );

        let mut categories = BTreeMap::new();
        categories.insert("texture".to_owned(), texture);
        categories.insert("rhythm".to_owned(), rhythm);
        VocabularyGlossary::new(categories)
    }

    #[test]
    fn terms_spans_categories() {
        let glossary = glossary();
        let terms: Vec<&str> = glossary.terms().collect();
        assert_eq!(terms.len(), 3);
        assert!(terms.contains(&"monophonic"));
        assert!(terms.contains(&"free rhythm"));
    }

    #[test]
    fn definition_finds_term_in_any_category() {
        let glossary = glossary();
        assert_eq!(
            glossary.definition("free rhythm"),
            Some("Unmeasured, following natural speech patterns")
        );
        assert_eq!(glossary.definition("isorhythmic"), None);
    }
}
