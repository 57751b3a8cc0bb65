//! Interview Coach - voice-driven mock technical interviews with AI feedback
//!
//! This library provides the pieces of the coach:
//! - Question generation and answer evaluation over a chain of LLM candidates
//! - Cleanup and parsing of model output
//! - Speech capture and playback (console or microphone/speaker)
//! - The interview turn-taking state machine
//! - `SQLite` persistence for sessions, answers and transcripts
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 InterviewOrchestrator               │
//! │   Welcome → Listening(i) → Evaluating(i) → ...      │
//! └───────┬──────────────┬──────────────┬───────────────┘
//!         │              │              │
//! ┌───────▼──────┐ ┌─────▼───────┐ ┌────▼───────────────┐
//! │SpeechPlayback│ │SpeechCapture│ │  FeedbackService   │
//! │  TTS / text  │ │ STT / text  │ │ ModelCaller→Parser │
//! └──────────────┘ └─────────────┘ └─────┬──────────────┘
//!                                        │
//!                              ┌─────────▼───────────┐
//!                              │ Gemini / OpenAI API │
//!                              └─────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod interview;
pub mod llm;
pub mod setup;
pub mod store;
pub mod voice;

pub use config::Config;
pub use db::{DbConn, DbPool, SessionRepo, SqliteStore};
pub use error::{Error, ErrorKind, Result};
pub use interview::{
    AnswerRecord, FeedbackRecord, FeedbackService, InterviewOrchestrator, InterviewSession,
    InterviewTranscript, Phase, Question, QuestionGenerator,
};
pub use llm::{GenerationBackend, HttpBackend, LlmProvider, ModelCaller, ModelResponse};
pub use store::InterviewStore;
