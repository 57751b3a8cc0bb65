//! Persistence boundary used by the orchestrator

use async_trait::async_trait;

use crate::Result;
use crate::interview::{AnswerRecord, InterviewTranscript, SessionDetails};

/// Session lookup and result persistence
#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Look up a prepared session
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if no such session exists
    async fn get_session(&self, session_id: &str) -> Result<SessionDetails>;

    /// Persist one evaluated answer
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    async fn save_answer(&self, session_id: &str, record: &AnswerRecord) -> Result<()>;

    /// Persist the completed interview
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    async fn save_transcript(&self, transcript: &InterviewTranscript) -> Result<()>;
}
