//! Per-answer evaluation

use super::types::{EvaluatorReply, FeedbackRecord};
use crate::llm::{ModelCaller, Parsed, parser};
use crate::{Error, Result};

/// Scores one answer through the model chain
#[derive(Debug, Clone)]
pub struct FeedbackService {
    caller: ModelCaller,
}

impl FeedbackService {
    #[must_use]
    pub const fn new(caller: ModelCaller) -> Self {
        Self { caller }
    }

    /// Evaluate `answer` to `question` for a candidate of `role` and `experience`
    ///
    /// Unparseable model output yields [`FeedbackRecord::fallback`] tagged
    /// with the model that produced it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any input is blank, or
    /// [`Error::AllModelsExhausted`] if no model responded
    pub async fn evaluate(
        &self,
        question: &str,
        answer: &str,
        role: &str,
        experience: &str,
    ) -> Result<FeedbackRecord> {
        for (field, value) in [
            ("question", question),
            ("answer", answer),
            ("role", role),
            ("experience", experience),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("{field} is required")));
            }
        }

        let prompt = evaluation_prompt(question, answer, role, experience);
        let response = self.caller.call(&prompt).await?;

        let mut record = match parser::parse_or(&response.text, EvaluatorReply::fallback) {
            Parsed::Structured(reply) => FeedbackRecord::from(reply),
            Parsed::Fallback(_) => {
                tracing::warn!(
                    model = %response.model_used,
                    "feedback unparseable, using default record"
                );
                FeedbackRecord::fallback()
            }
        };
        record.model_used = Some(response.model_used);
        tracing::info!(
            score = record.score,
            model = ?record.model_used,
            fallback = record.fallback,
            "answer evaluated"
        );
        Ok(record)
    }
}

fn evaluation_prompt(question: &str, answer: &str, role: &str, experience: &str) -> String {
    format!(
        r#"You are a strict technical interview evaluator.

Role: {role}
Experience Level: {experience}

Interview Question:
{question}

Candidate Answer:
{answer}

Evaluate the answer and respond in STRICT JSON ONLY.

Format:
{{
  "score": number (0-10),
  "strengths": "what was done well",
  "improvements": "what can be improved",
  "idealAnswerHint": "brief hint of a strong answer"
}}

IMPORTANT RULES:
- Do NOT include markdown
- Do NOT include explanation text
- ONLY valid JSON
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_inputs() {
        let prompt = evaluation_prompt(
            "What is a closure?",
            "A function with captured state.",
            "Backend Engineer",
            "2 years",
        );
        assert!(prompt.contains("Role: Backend Engineer"));
        assert!(prompt.contains("Experience Level: 2 years"));
        assert!(prompt.contains("Interview Question:\nWhat is a closure?"));
        assert!(prompt.contains("Candidate Answer:\nA function with captured state."));
        assert!(prompt.contains("\"idealAnswerHint\""));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = evaluation_prompt("q", "a", "r", "e");
        let b = evaluation_prompt("q", "a", "r", "e");
        assert_eq!(a, b);
    }
}
