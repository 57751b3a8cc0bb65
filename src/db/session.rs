//! Session repository for interview sessions, answers and transcripts

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use super::DbPool;
use crate::interview::{
    AnswerRecord, FeedbackRecord, InterviewTranscript, Question, SessionDetails, SessionStatus,
};
use crate::{Error, Result};

/// Input for creating a session
#[derive(Debug, Clone)]
pub struct NewSession {
    pub role: String,
    pub experience_level: String,
    pub topics: Vec<String>,
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

/// One line of the session listing
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub id: String,
    pub role: String,
    pub experience_level: String,
    pub status: SessionStatus,
    pub question_count: usize,
    pub total_answers: usize,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Session repository
#[derive(Clone)]
pub struct SessionRepo {
    pool: DbPool,
}

impl SessionRepo {
    /// Create a new session repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Store a new draft session with its questions
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn create(&self, new: &NewSession) -> Result<SessionDetails> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let topics = serde_json::to_string(&new.topics)?;

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO sessions (id, role, experience, topics, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'draft', ?6, ?6)",
            params![id, new.role, new.experience_level, topics, new.description, now],
        )?;

        for (position, question) in new.questions.iter().enumerate() {
            tx.execute(
                "INSERT INTO questions (id, session_id, position, question, answer)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    question.id,
                    id,
                    to_i64(position),
                    question.text,
                    question.reference_answer
                ],
            )?;
        }
        tx.commit()?;

        tracing::info!(session = %id, questions = new.questions.len(), "session created");

        Ok(SessionDetails {
            id,
            role: new.role.clone(),
            experience_level: new.experience_level.clone(),
            topics: new.topics.clone(),
            description: new.description.clone(),
            questions: new.questions.clone(),
            status: SessionStatus::Draft,
        })
    }

    /// Get a session with its questions in interview order
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the session does not exist
    pub fn get(&self, session_id: &str) -> Result<SessionDetails> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let row = conn
            .query_row(
                "SELECT id, role, experience, topics, description, status
                 FROM sessions WHERE id = ?1",
                [session_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, role, experience_level, topics, description, status)) = row else {
            return Err(Error::NotFound(format!("session {session_id}")));
        };

        let mut stmt = conn.prepare(
            "SELECT id, question, answer FROM questions
             WHERE session_id = ?1 ORDER BY position",
        )?;
        let questions = stmt
            .query_map([session_id], |row| {
                Ok(Question {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    reference_answer: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(SessionDetails {
            id,
            role,
            experience_level,
            topics: serde_json::from_str(&topics).unwrap_or_default(),
            description,
            questions,
            status: SessionStatus::parse(&status).unwrap_or(SessionStatus::Draft),
        })
    }

    /// List all sessions, newest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list(&self) -> Result<Vec<SessionRow>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT s.id, s.role, s.experience, s.status, s.total_answers, s.created_at,
                    s.completed_at,
                    (SELECT COUNT(*) FROM questions q WHERE q.session_id = s.id)
             FROM sessions s ORDER BY s.created_at DESC",
        )?;

        let sessions = stmt
            .query_map([], |row| {
                Ok(SessionRow {
                    id: row.get(0)?,
                    role: row.get(1)?,
                    experience_level: row.get(2)?,
                    status: SessionStatus::parse(&row.get::<_, String>(3)?)
                        .unwrap_or(SessionStatus::Draft),
                    total_answers: from_i64(row.get(4)?),
                    created_at: parse_datetime(&row.get::<_, String>(5)?),
                    completed_at: row
                        .get::<_, Option<String>>(6)?
                        .map(|s| parse_datetime(&s)),
                    question_count: from_i64(row.get(7)?),
                })
            })?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(sessions)
    }

    /// Record one evaluated answer and mark the session in progress
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the session does not exist
    pub fn save_answer(&self, session_id: &str, record: &AnswerRecord) -> Result<()> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let feedback = record
            .feedback
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let now = Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE sessions
             SET total_answers = total_answers + 1, status = 'in-progress', updated_at = ?2
             WHERE id = ?1",
            params![session_id, now],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("session {session_id}")));
        }

        tx.execute(
            "INSERT INTO answers
                (id, session_id, question_id, question_index, question, answer, feedback, answered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Uuid::new_v4().to_string(),
                session_id,
                record.question_id,
                to_i64(record.question_index),
                record.question_text,
                record.answer_text,
                feedback,
                record.timestamp.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        tracing::debug!(session = %session_id, index = record.question_index, "answer saved");
        Ok(())
    }

    /// Store the completion payload and mark the session completed
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the session does not exist
    pub fn save_transcript(&self, transcript: &InterviewTranscript) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let payload = serde_json::to_string(&transcript.feedbacks)?;
        let updated = conn.execute(
            "UPDATE sessions
             SET transcript = ?2, completed_at = ?3, total_answers = ?4,
                 status = 'completed', updated_at = ?5
             WHERE id = ?1",
            params![
                transcript.session_id,
                payload,
                transcript.completed_at.to_rfc3339(),
                to_i64(transcript.total_answers),
                Utc::now().to_rfc3339(),
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("session {}", transcript.session_id)));
        }

        tracing::info!(session = %transcript.session_id, "transcript saved");
        Ok(())
    }

    /// Stored completion payload, if the session has completed
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the session does not exist
    pub fn transcript(&self, session_id: &str) -> Result<Option<InterviewTranscript>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let row = conn
            .query_row(
                "SELECT transcript, completed_at, total_answers FROM sessions WHERE id = ?1",
                [session_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("session {session_id}")))?;

        let (Some(payload), Some(completed_at), total_answers) = row else {
            return Ok(None);
        };

        Ok(Some(InterviewTranscript {
            session_id: session_id.to_string(),
            feedbacks: serde_json::from_str(&payload)?,
            completed_at: parse_datetime(&completed_at),
            total_answers: from_i64(total_answers),
        }))
    }

    /// Answers for a session, ordered by question index
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn answers(&self, session_id: &str) -> Result<Vec<AnswerRecord>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT a.question_id, a.question_index, a.question, a.answer, a.feedback,
                    a.answered_at, COALESCE(q.answer, '')
             FROM answers a
             LEFT JOIN questions q ON q.id = a.question_id
             WHERE a.session_id = ?1
             ORDER BY a.question_index, a.created_at",
        )?;

        let answers = stmt
            .query_map([session_id], |row| {
                let feedback: Option<String> = row.get(4)?;
                Ok(AnswerRecord {
                    question_id: row.get(0)?,
                    question_index: from_i64(row.get(1)?),
                    question_text: row.get(2)?,
                    answer_text: row.get(3)?,
                    feedback: feedback.and_then(|f| parse_feedback(&f)),
                    timestamp: parse_datetime(&row.get::<_, String>(5)?),
                    expected_answer: row.get(6)?,
                })
            })?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(answers)
    }
}

fn parse_feedback(json: &str) -> Option<FeedbackRecord> {
    serde_json::from_str(json)
        .map_err(|e| tracing::warn!(error = %e, "stored feedback unreadable"))
        .ok()
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn from_i64(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    fn setup() -> SessionRepo {
        SessionRepo::new(init_memory().unwrap())
    }

    fn new_session() -> NewSession {
        NewSession {
            role: "Backend Engineer".to_string(),
            experience_level: "2 years".to_string(),
            topics: vec!["Rust".to_string(), "SQL".to_string()],
            description: None,
            questions: vec![
                Question {
                    id: "q1".to_string(),
                    text: "What is a closure?".to_string(),
                    reference_answer: "A function that captures its environment.".to_string(),
                },
                Question {
                    id: "q2".to_string(),
                    text: "What is an index?".to_string(),
                    reference_answer: String::new(),
                },
            ],
        }
    }

    fn answer(index: usize, question_id: &str) -> AnswerRecord {
        AnswerRecord {
            question_id: question_id.to_string(),
            question_index: index,
            question_text: "question".to_string(),
            expected_answer: String::new(),
            answer_text: "my answer".to_string(),
            feedback: Some(FeedbackRecord::fallback()),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_create_and_get() {
        let repo = setup();
        let created = repo.create(&new_session()).unwrap();

        let loaded = repo.get(&created.id).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.status, SessionStatus::Draft);
        assert_eq!(loaded.questions[0].text, "What is a closure?");
        assert_eq!(loaded.topics, vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let repo = setup();
        assert!(matches!(repo.get("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_save_answer_marks_in_progress() {
        let repo = setup();
        let session = repo.create(&new_session()).unwrap();

        repo.save_answer(&session.id, &answer(1, "q2")).unwrap();
        repo.save_answer(&session.id, &answer(0, "q1")).unwrap();

        assert_eq!(repo.get(&session.id).unwrap().status, SessionStatus::InProgress);

        let answers = repo.answers(&session.id).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].question_index, 0);
        assert_eq!(
            answers[0].expected_answer,
            "A function that captures its environment."
        );
        assert!(answers[0].feedback.as_ref().unwrap().fallback);

        let listed = repo.list().unwrap();
        assert_eq!(listed[0].total_answers, 2);
        assert_eq!(listed[0].question_count, 2);
    }

    #[test]
    fn test_save_answer_for_missing_session() {
        let repo = setup();
        let err = repo.save_answer("nope", &answer(0, "q1")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_save_transcript_completes_session() {
        let repo = setup();
        let session = repo.create(&new_session()).unwrap();
        assert!(repo.transcript(&session.id).unwrap().is_none());

        let transcript = InterviewTranscript {
            session_id: session.id.clone(),
            feedbacks: vec![answer(0, "q1")],
            completed_at: Utc::now(),
            total_answers: 1,
        };
        repo.save_transcript(&transcript).unwrap();

        let stored = repo.transcript(&session.id).unwrap().unwrap();
        assert_eq!(stored.total_answers, 1);
        assert_eq!(stored.feedbacks.len(), 1);
        assert_eq!(repo.get(&session.id).unwrap().status, SessionStatus::Completed);
    }
}
