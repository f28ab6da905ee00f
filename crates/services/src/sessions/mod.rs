mod exam;
mod flashcards;
mod quiz;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use exam::{
    EXAM_DURATION_SECONDS, EXAM_MAX_SCORE, EXAM_PIECE_COUNT, ExamAnsweredPiece, ExamOutcome,
    ExamSession, Recommendation, TickOutcome,
};
pub use flashcards::{CardFace, FlashcardOutcome, FlashcardSession, SessionPhase};
pub use quiz::{AnsweredQuestion, QuizOutcome, QuizProgress, QuizSession};
pub use workflow::{ExamLoopService, FlashcardLoopService, QuizLoopService, StepResult};
