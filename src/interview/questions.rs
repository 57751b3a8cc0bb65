//! Question generation and concept explanations

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::Question;
use crate::config::DEFAULT_MAX_QUESTIONS;
use crate::llm::{ModelCaller, parser};
use crate::{Error, Result};

/// Parameters for a generated question set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub role: String,
    pub experience_level: String,
    pub topics: Vec<String>,
    pub count: usize,
}

/// A question/answer pair as the model returns it
#[derive(Debug, Deserialize)]
struct GeneratedPair {
    question: String,
    #[serde(default)]
    answer: String,
}

/// Short explanation of the concept behind a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptExplanation {
    pub title: String,
    pub explanation: String,
}

/// Generates question sets and explanations through the model chain
#[derive(Debug, Clone)]
pub struct QuestionGenerator {
    caller: ModelCaller,
    max_questions: usize,
}

impl QuestionGenerator {
    #[must_use]
    pub const fn new(caller: ModelCaller) -> Self {
        Self {
            caller,
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }

    /// Override the upper bound on `count`
    #[must_use]
    pub const fn with_max_questions(mut self, max_questions: usize) -> Self {
        self.max_questions = max_questions;
        self
    }

    /// Generate `request.count` questions in interview order
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for missing inputs or an out-of-range
    /// count, [`Error::AllModelsExhausted`] if no model responded, and
    /// [`Error::Parse`] if the output is not a non-empty question list
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>> {
        self.validate(request)?;

        let prompt = question_prompt(request);
        let response = self.caller.call(&prompt).await?;
        let mut pairs: Vec<GeneratedPair> = parser::parse(&response.text)?;

        pairs.retain(|p| !p.question.trim().is_empty());
        if pairs.is_empty() {
            return Err(Error::Parse("model returned no questions".to_string()));
        }
        if pairs.len() > request.count {
            tracing::debug!(
                returned = pairs.len(),
                requested = request.count,
                "truncating surplus questions"
            );
            pairs.truncate(request.count);
        } else if pairs.len() < request.count {
            tracing::warn!(
                returned = pairs.len(),
                requested = request.count,
                "model returned fewer questions than requested"
            );
        }

        tracing::info!(
            count = pairs.len(),
            model = %response.model_used,
            "questions generated"
        );

        Ok(pairs
            .into_iter()
            .map(|p| Question {
                id: Uuid::new_v4().to_string(),
                text: p.question.trim().to_string(),
                reference_answer: p.answer.trim().to_string(),
            })
            .collect())
    }

    /// Explain the concept behind `question`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank question,
    /// [`Error::AllModelsExhausted`] if no model responded, and
    /// [`Error::Parse`] if the output does not parse
    pub async fn explain(&self, question: &str) -> Result<ConceptExplanation> {
        if question.trim().is_empty() {
            return Err(Error::Validation("question is required".to_string()));
        }

        let response = self.caller.call(&explanation_prompt(question)).await?;
        let explanation: ConceptExplanation = parser::parse(&response.text)?;
        tracing::info!(model = %response.model_used, title = %explanation.title, "explanation generated");
        Ok(explanation)
    }

    fn validate(&self, request: &GenerationRequest) -> Result<()> {
        if request.role.trim().is_empty() {
            return Err(Error::Validation("role is required".to_string()));
        }
        if request.experience_level.trim().is_empty() {
            return Err(Error::Validation("experience is required".to_string()));
        }
        if request.topics.iter().all(|t| t.trim().is_empty()) {
            return Err(Error::Validation("at least one topic is required".to_string()));
        }
        if request.count == 0 {
            return Err(Error::Validation(
                "number of questions must be at least 1".to_string(),
            ));
        }
        if request.count > self.max_questions {
            return Err(Error::Validation(format!(
                "number of questions must be at most {}",
                self.max_questions
            )));
        }
        Ok(())
    }
}

fn question_prompt(request: &GenerationRequest) -> String {
    let topics = request
        .topics
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are an AI trained to generate technical interview questions and answers.

Role: {role}
Candidate Experience: {experience}
Focus Topics: {topics}

Write exactly {count} interview questions.
For each question, write a detailed but beginner-friendly answer.
If an answer needs a code example, include a small code block inside the answer text.

Return a pure JSON array like:
[
  {{
    "question": "Question here?",
    "answer": "Answer here."
  }}
]

IMPORTANT RULES:
- Do NOT include markdown outside the JSON
- Do NOT include any text before or after the array
- ONLY valid JSON
"#,
        role = request.role.trim(),
        experience = request.experience_level.trim(),
        count = request.count,
    )
}

fn explanation_prompt(question: &str) -> String {
    format!(
        r#"You are an AI trained to explain interview concepts to a developer.

Explain the concept behind this interview question in depth, as if teaching a beginner:
{question}

Give the explanation a short, clear title. If a code example helps, include a small code block inside the explanation text.

Return a pure JSON object like:
{{
  "title": "Short title here",
  "explanation": "Explanation here."
}}

IMPORTANT RULES:
- Do NOT include markdown outside the JSON
- ONLY valid JSON
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(count: usize) -> GenerationRequest {
        GenerationRequest {
            role: "Backend Engineer".to_string(),
            experience_level: "2 years".to_string(),
            topics: vec!["Rust".to_string(), " async ".to_string()],
            count,
        }
    }

    #[test]
    fn test_prompt_requests_exact_count() {
        let prompt = question_prompt(&request(7));
        assert!(prompt.contains("Write exactly 7 interview questions."));
        assert!(prompt.contains("Focus Topics: Rust, async"));
    }

    #[test]
    fn test_explanation_prompt_embeds_question() {
        let prompt = explanation_prompt("What is ownership?");
        assert!(prompt.contains("What is ownership?"));
        assert!(prompt.contains("\"title\""));
    }
}
