//! Interview session state

use super::types::{AnswerRecord, InterviewContext, Question, SessionDetails};
use crate::{Error, Result};

/// Where the interview is in its turn-taking cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started
    Welcome,
    /// Capturing the answer to question `i`
    Listening(usize),
    /// Evaluating the answer to question `i`
    Evaluating(usize),
    /// Terminal
    Completed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Welcome => f.write_str("welcome"),
            Self::Listening(i) => write!(f, "listening({i})"),
            Self::Evaluating(i) => write!(f, "evaluating({i})"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

/// An interview in progress, owned by one orchestrator
#[derive(Debug, Clone)]
pub struct InterviewSession {
    id: String,
    context: InterviewContext,
    questions: Vec<Question>,
    current_index: usize,
    answers: Vec<AnswerRecord>,
    phase: Phase,
}

impl InterviewSession {
    /// Create a session in the `Welcome` phase
    ///
    /// # Errors
    ///
    /// Returns error if there are no questions or the context is incomplete
    pub fn new(
        id: impl Into<String>,
        context: InterviewContext,
        questions: Vec<Question>,
    ) -> Result<Self> {
        if questions.is_empty() {
            return Err(Error::Validation("session has no questions".to_string()));
        }
        if context.role.trim().is_empty() || context.experience_level.trim().is_empty() {
            return Err(Error::Validation(
                "role and experience level are required".to_string(),
            ));
        }

        Ok(Self {
            id: id.into(),
            context,
            questions,
            current_index: 0,
            answers: Vec::new(),
            phase: Phase::Welcome,
        })
    }

    /// Build a session from stored details
    ///
    /// # Errors
    ///
    /// Returns error if the stored session has no questions
    pub fn from_details(details: SessionDetails, candidate_name: impl Into<String>) -> Result<Self> {
        let context = InterviewContext {
            candidate_name: candidate_name.into(),
            role: details.role,
            experience_level: details.experience_level,
        };
        Self::new(details.id, context, details.questions)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn context(&self) -> &InterviewContext {
        &self.context
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether `index` is the last question
    #[must_use]
    pub const fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.questions.len()
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        if let Phase::Listening(i) | Phase::Evaluating(i) = phase {
            debug_assert!(i >= self.current_index, "question index moved backwards");
            self.current_index = i;
        }
        if phase == Phase::Completed {
            self.current_index = self.questions.len();
        }
        self.phase = phase;
    }

    pub(crate) fn push_answer(&mut self, record: AnswerRecord) {
        self.answers.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> InterviewContext {
        InterviewContext {
            candidate_name: "Ada".to_string(),
            role: "Backend Engineer".to_string(),
            experience_level: "2 years".to_string(),
        }
    }

    fn question(text: &str) -> Question {
        Question {
            id: text.to_string(),
            text: text.to_string(),
            reference_answer: String::new(),
        }
    }

    #[test]
    fn test_new_session_starts_in_welcome() {
        let session = InterviewSession::new("s1", context(), vec![question("q1")]).unwrap();
        assert_eq!(session.phase(), Phase::Welcome);
        assert_eq!(session.current_index(), 0);
        assert!(session.is_last(0));
    }

    #[test]
    fn test_empty_questions_rejected() {
        let err = InterviewSession::new("s1", context(), Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_completed_moves_index_past_end() {
        let mut session =
            InterviewSession::new("s1", context(), vec![question("q1"), question("q2")]).unwrap();
        session.set_phase(Phase::Listening(1));
        assert_eq!(session.current_index(), 1);
        session.set_phase(Phase::Completed);
        assert_eq!(session.current_index(), 2);
    }
}
