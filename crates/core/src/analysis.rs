use crate::model::{CharacteristicsEntry, Piece, VocabularyGlossary};
use crate::scoring::answer_score;

/// The learner's answers for one exam piece.
///
/// Identification fields mirror the quiz; `characteristics` is the
/// free-text listening analysis. Empty strings are legal and score 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExamAnswers {
    pub composer: String,
    pub title: String,
    pub genre: String,
    pub characteristics: String,
}

/// Identification points for one exam piece, 0 through 3.
///
/// One point per field whose fuzzy score reaches 0.8, which admits
/// exact matches and containment but not loose word overlap.
#[must_use]
pub fn identification_points(answers: &ExamAnswers, piece: &Piece) -> u8 {
    let mut points = 0;
    if answer_score(&answers.composer, piece.composer()) >= 0.8 {
        points += 1;
    }
    if answer_score(&answers.title, piece.title()) >= 0.8 {
        points += 1;
    }
    if answer_score(&answers.genre, piece.genre()) >= 0.8 {
        points += 1;
    }
    points
}

/// Split free text into lowercase alphanumeric words.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Concept-match score of a free-text analysis in `[0, 1]`.
///
/// A reference phrase counts as matched when any of its words longer than
/// three characters substring-matches (either direction) a word of the
/// user text. Each glossary term found verbatim in the text adds a 0.5
/// bonus to the match count. The final ratio against the phrase count is
/// capped at 1 after the bonus.
#[must_use]
pub fn concept_score(
    user_text: &str,
    entry: &CharacteristicsEntry,
    glossary: &VocabularyGlossary,
) -> f64 {
    let phrases = entry.key_characteristics();
    if user_text.trim().is_empty() || phrases.is_empty() {
        return 0.0;
    }

    let lowered = user_text.to_lowercase();
    let user_words = tokenize(user_text);

    let mut matches = 0.0;
    for phrase in phrases {
        let concept_match = tokenize(phrase).into_iter().any(|word| {
            word.chars().count() > 3
                && user_words
                    .iter()
                    .any(|user_word| user_word.contains(&word) || word.contains(user_word.as_str()))
        });
        if concept_match {
            matches += 1.0;
        }
    }

    for term in glossary.terms() {
        if lowered.contains(&term.to_lowercase()) {
            matches += 0.5;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let ratio = matches / phrases.len() as f64;
    ratio.min(1.0)
}

/// Analysis points for one exam piece, 0 through 2.
///
/// The concept score is scaled to two points and rounded. A missing
/// characteristics entry or an empty analysis yields 0.
#[must_use]
pub fn analysis_points(
    user_text: &str,
    entry: Option<&CharacteristicsEntry>,
    glossary: &VocabularyGlossary,
) -> u8 {
    let Some(entry) = entry else { return 0 };
    if user_text.trim().is_empty() {
        return 0;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let points = (concept_score(user_text, entry, glossary) * 2.0).round() as u8;
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn chant_entry() -> CharacteristicsEntry {
        CharacteristicsEntry::new(
            vec![
                "monophonic texture".to_owned(),
                "modal scales".to_owned(),
                "free rhythm".to_owned(),
                "melismatic passages".to_owned(),
            ],
            "Medieval",
        )
    }

    fn glossary() -> VocabularyGlossary {
        let mut texture = BTreeMap::new();
        texture.insert(
            "monophonic".to_owned(),
            "Single melodic line without accompaniment".to_owned(),
        );
        texture.insert(
            "melismatic".to_owned(),
            "Many notes sung on a single syllable".to_owned(),
        );
        let mut categories = BTreeMap::new();
        categories.insert("texture".to_owned(), texture);
        VocabularyGlossary::new(categories)
    }

    fn piece() -> Piece {
        Piece::new(
            "1a",
            "Anonymous",
            "Agnus Dei",
            "Chant",
            "audio/1a_anonymous_agnus_dei.mp3",
            None,
        )
        .unwrap()
    }

    #[test]
    fn identification_awards_one_point_per_field() {
        let answers = ExamAnswers {
            composer: "anonymous".to_owned(),
            title: "agnus".to_owned(),
            genre: "motet".to_owned(),
            characteristics: String::new(),
        };
        // "agnus" is contained in "agnus dei", so it clears the 0.8 bar.
        assert_eq!(identification_points(&answers, &piece()), 2);
    }

    #[test]
    fn identification_is_bounded_by_three() {
        let answers = ExamAnswers {
            composer: "Anonymous".to_owned(),
            title: "Agnus Dei".to_owned(),
            genre: "Chant".to_owned(),
            characteristics: String::new(),
        };
        assert_eq!(identification_points(&answers, &piece()), 3);
    }

    #[test]
    fn concept_score_counts_matched_phrases() {
        // "monophonic" matches one phrase, "rhythm" another; the
        // "monophonic" glossary term adds a 0.5 bonus.
        let score = concept_score("monophonic chant with free rhythm", &chant_entry(), &glossary());
        assert!((score - (2.0 + 0.5) / 4.0).abs() < 1e-9);
    }

    #[test]
    fn concept_score_is_capped_at_one() {
        let text = "monophonic texture modal scales free rhythm melismatic passages";
        let score = concept_score(text, &chant_entry(), &glossary());
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn short_stopwords_never_match_phrases() {
        let entry = CharacteristicsEntry::new(vec!["use of drone".to_owned()], "Medieval");
        let score = concept_score("of the and a", &entry, &VocabularyGlossary::default());
        assert!((score - 0.0).abs() < 1e-9);
    }

    #[test]
    fn analysis_points_scale_and_round() {
        let entry = chant_entry();
        let glossary = VocabularyGlossary::default();
        // 1 of 4 phrases matched: 0.25 * 2 rounds to 1 point.
        assert_eq!(analysis_points("melismatic singing", Some(&entry), &glossary), 1);
        assert_eq!(analysis_points("", Some(&entry), &glossary), 0);
        assert_eq!(analysis_points("anything", None, &glossary), 0);
    }

    #[test]
    fn analysis_points_reach_two_for_thorough_answers() {
        let text = "monophonic texture, modal scales, free rhythm everywhere";
        assert_eq!(analysis_points(text, Some(&chant_entry()), &glossary()), 2);
    }
}
