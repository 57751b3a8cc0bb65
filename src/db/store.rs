//! `SQLite`-backed [`InterviewStore`]

use async_trait::async_trait;

use super::{DbPool, SessionRepo};
use crate::interview::{AnswerRecord, InterviewTranscript, SessionDetails};
use crate::store::InterviewStore;
use crate::{Error, Result};

/// Interview store over the local database
#[derive(Clone)]
pub struct SqliteStore {
    repo: SessionRepo,
}

impl SqliteStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self {
            repo: SessionRepo::new(pool),
        }
    }

    #[must_use]
    pub const fn repo(&self) -> &SessionRepo {
        &self.repo
    }
}

#[async_trait]
impl InterviewStore for SqliteStore {
    async fn get_session(&self, session_id: &str) -> Result<SessionDetails> {
        self.repo.get(session_id)
    }

    async fn save_answer(&self, session_id: &str, record: &AnswerRecord) -> Result<()> {
        self.repo
            .save_answer(session_id, record)
            .map_err(|e| Error::Persistence(format!("save answer: {e}")))
    }

    async fn save_transcript(&self, transcript: &InterviewTranscript) -> Result<()> {
        self.repo
            .save_transcript(transcript)
            .map_err(|e| Error::Persistence(format!("save transcript: {e}")))
    }
}
