#![forbid(unsafe_code)]

pub mod analytics;
pub mod app_services;
pub mod catalog;
pub mod choices;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use analytics::AnalyticsService;
pub use app_services::AppServices;
pub use catalog::{AssignmentFilter, Catalog};
pub use choices::{ChoiceSet, QuestionMaterial};
pub use error::{AnalyticsError, CatalogError, SessionError};

pub use sessions::{
    ExamLoopService, ExamOutcome, ExamSession, FlashcardLoopService, FlashcardOutcome,
    FlashcardSession, QuizLoopService, QuizOutcome, QuizSession, Recommendation, StepResult,
    TickOutcome,
};
