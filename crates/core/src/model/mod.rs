mod characteristics;
mod flashcard;
mod piece;
mod records;

pub use characteristics::{CharacteristicsEntry, CharacteristicsMap, VocabularyGlossary};
pub use flashcard::{AnswerDetail, Flashcard, FlashcardError, FlashcardId};
pub use piece::{Piece, PieceError, PieceKey, QuizField};
pub use records::{
    AnalyticsState, ExamAnswerSummary, ExamRecord, FlashcardRecord, ListeningStats, QuizRecord,
};
