//! Interview preparation and conduct
//!
//! Question generation and answer evaluation go through the model chain in
//! [`crate::llm`]; [`InterviewOrchestrator`] runs the spoken turn-taking.

mod feedback;
mod orchestrator;
mod questions;
pub mod script;
mod session;
mod summary;
mod types;

pub use feedback::FeedbackService;
pub use orchestrator::{AdvanceOutcome, Command, InterviewEvent, InterviewOrchestrator};
pub use questions::{ConceptExplanation, GenerationRequest, QuestionGenerator};
pub use session::{InterviewSession, Phase};
pub use summary::{FeedbackSummary, PerformanceLevel, STRONG_ANSWER_SCORE};
pub use types::{
    AnswerRecord, EvaluatorReply, FALLBACK_SCORE, FeedbackRecord, InterviewContext,
    InterviewTranscript, MAX_SCORE, Question, SessionDetails, SessionStatus,
};
