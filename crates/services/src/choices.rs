use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Piece, QuizField};
use quiz_core::scoring::{Difficulty, hint_for};

/// Number of wrong options drawn for a multiple-choice question.
const DISTRACTOR_COUNT: usize = 3;

/// Fisher-Yates shuffle into a fresh vector.
pub fn shuffled<T: Clone>(items: &[T], rng: &mut impl Rng) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

/// One multiple-choice option group for a single field.
///
/// The correct value appears exactly once; distractors come from other
/// pieces' values for the same field, so duplicates among them are
/// possible when pieces share a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSet {
    pub field: QuizField,
    pub options: Vec<String>,
}

impl ChoiceSet {
    /// Build the option group for `field` of `target`.
    ///
    /// Distractors are shuffled before being cut to three, and the full
    /// option list is shuffled again so the correct slot is uniform.
    pub fn build(pieces: &[Piece], target: &Piece, field: QuizField, rng: &mut impl Rng) -> Self {
        let correct = target.field(field);
        let wrong: Vec<String> = pieces
            .iter()
            .filter(|piece| piece.field(field) != correct)
            .map(|piece| piece.field(field).to_owned())
            .collect();

        let mut options = shuffled(&wrong, rng);
        options.truncate(DISTRACTOR_COUNT);
        options.push(correct.to_owned());
        options.shuffle(rng);

        Self {
            field,
            options,
        }
    }
}

/// Prompt material for one quiz question, shaped by the difficulty tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionMaterial {
    /// Easy: one option group per field.
    MultipleChoice {
        title: ChoiceSet,
        composer: ChoiceSet,
        genre: ChoiceSet,
    },
    /// Medium: free text with a masking hint per field.
    HintedFreeText {
        title_hint: String,
        composer_hint: String,
        genre_hint: String,
    },
    /// Hard: free text, no help.
    FreeText,
}

/// Build the prompt material for the current question.
///
/// `pieces` is the full catalog pool so distractors can come from
/// anywhere, matching the original app.
pub fn question_material(
    pieces: &[Piece],
    target: &Piece,
    difficulty: Difficulty,
    rng: &mut impl Rng,
) -> QuestionMaterial {
    match difficulty {
        Difficulty::Easy => QuestionMaterial::MultipleChoice {
            title: ChoiceSet::build(pieces, target, QuizField::Title, rng),
            composer: ChoiceSet::build(pieces, target, QuizField::Composer, rng),
            genre: ChoiceSet::build(pieces, target, QuizField::Genre, rng),
        },
        Difficulty::Medium => QuestionMaterial::HintedFreeText {
            title_hint: hint_for(target.title()),
            composer_hint: hint_for(target.composer()),
            genre_hint: hint_for(target.genre()),
        },
        Difficulty::Hard => QuestionMaterial::FreeText,
    }
}
