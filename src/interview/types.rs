//! Interview data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score reported when the evaluator's output could not be parsed
pub const FALLBACK_SCORE: f32 = 5.0;

/// Highest possible score
pub const MAX_SCORE: f32 = 10.0;

/// A generated interview question with its reference answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "question")]
    pub text: String,
    #[serde(rename = "answer", default)]
    pub reference_answer: String,
}

/// Evaluation of one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// Always within `0.0..=10.0`
    pub score: f32,
    pub strengths: String,
    pub improvements: String,
    pub ideal_answer_hint: String,
    /// Candidate model that produced the evaluation
    #[serde(default)]
    pub model_used: Option<String>,
    /// True when this is the fixed default used for unparseable output
    #[serde(default)]
    pub fallback: bool,
}

impl FeedbackRecord {
    /// The fixed record used when the evaluator's output is unparseable
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            fallback: true,
            ..EvaluatorReply::fallback().into()
        }
    }
}

/// The evaluator model's reply
///
/// Only the assessment itself is read from model output; provenance is
/// attached by the caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEvaluation")]
pub struct EvaluatorReply {
    pub score: f32,
    pub strengths: String,
    pub improvements: String,
    pub ideal_answer_hint: String,
}

impl EvaluatorReply {
    /// Default assessment for output that could not be parsed
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            score: FALLBACK_SCORE,
            strengths: "Answer addresses the question at a basic level.".to_string(),
            improvements: "Needs more depth, structure, and technical clarity.".to_string(),
            ideal_answer_hint: "Explain the concept clearly with an example.".to_string(),
        }
    }
}

impl From<EvaluatorReply> for FeedbackRecord {
    fn from(reply: EvaluatorReply) -> Self {
        Self {
            score: reply.score,
            strengths: reply.strengths,
            improvements: reply.improvements,
            ideal_answer_hint: reply.ideal_answer_hint,
            model_used: None,
            fallback: false,
        }
    }
}

/// Wire shape of an evaluation as models actually return it
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvaluation {
    score: Option<ScoreValue>,
    #[serde(default)]
    strengths: Option<TextOrList>,
    #[serde(default)]
    improvements: Option<TextOrList>,
    #[serde(default, alias = "ideal_answer_hint")]
    ideal_answer_hint: Option<TextOrList>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreValue {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl From<TextOrList> for String {
    fn from(value: TextOrList) -> Self {
        match value {
            TextOrList::Text(text) => text,
            TextOrList::List(items) => items.join("; "),
        }
    }
}

impl TryFrom<RawEvaluation> for EvaluatorReply {
    type Error = String;

    fn try_from(raw: RawEvaluation) -> Result<Self, Self::Error> {
        let score = match raw.score {
            Some(ScoreValue::Number(n)) => n,
            Some(ScoreValue::Text(s)) => s
                .trim()
                .trim_end_matches("/10")
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("score is not numeric: {s:?}"))?,
            None => return Err("missing score".to_string()),
        };
        if !score.is_finite() {
            return Err("score is not finite".to_string());
        }

        #[allow(clippy::cast_possible_truncation)]
        let score = score.clamp(0.0, f64::from(MAX_SCORE)) as f32;

        Ok(Self {
            score,
            strengths: raw.strengths.map(String::from).unwrap_or_default(),
            improvements: raw.improvements.map(String::from).unwrap_or_default(),
            ideal_answer_hint: raw.ideal_answer_hint.map(String::from).unwrap_or_default(),
        })
    }
}

/// One answered question, frozen when the candidate advanced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: String,
    pub question_index: usize,
    pub question_text: String,
    #[serde(default)]
    pub expected_answer: String,
    pub answer_text: String,
    /// `None` when no model could evaluate the answer
    pub feedback: Option<FeedbackRecord>,
    pub timestamp: DateTime<Utc>,
}

/// Completion payload handed to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewTranscript {
    pub session_id: String,
    pub feedbacks: Vec<AnswerRecord>,
    pub completed_at: DateTime<Utc>,
    pub total_answers: usize,
}

/// Lifecycle of a stored session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Draft,
    InProgress,
    Completed,
}

impl SessionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prepared interview as returned by session lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    pub id: String,
    pub role: String,
    pub experience_level: String,
    pub topics: Vec<String>,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub status: SessionStatus,
}

/// Who is being interviewed, for what
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewContext {
    pub candidate_name: String,
    pub role: String,
    pub experience_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_accepts_lists_and_string_scores() {
        let raw = r#"{
            "score": "8",
            "strengths": ["clear", "concise"],
            "improvements": "mention lifetimes",
            "idealAnswerHint": "Show a closure capturing by move."
        }"#;
        let reply: EvaluatorReply = serde_json::from_str(raw).unwrap();
        assert!((reply.score - 8.0).abs() < f32::EPSILON);
        assert_eq!(reply.strengths, "clear; concise");
        assert_eq!(reply.improvements, "mention lifetimes");
    }

    #[test]
    fn test_model_cannot_set_provenance() {
        let raw = r#"{
            "score": 9,
            "strengths": "thorough",
            "improvements": "none",
            "idealAnswerHint": "as given",
            "fallback": true,
            "modelUsed": "made-up-model"
        }"#;
        let record = FeedbackRecord::from(serde_json::from_str::<EvaluatorReply>(raw).unwrap());
        assert!(!record.fallback);
        assert!(record.model_used.is_none());
        assert!((record.score - 9.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_feedback_score_clamped() {
        let reply: EvaluatorReply = serde_json::from_str(r#"{"score": 14}"#).unwrap();
        assert!((reply.score - MAX_SCORE).abs() < f32::EPSILON);
        let reply: EvaluatorReply = serde_json::from_str(r#"{"score": -2}"#).unwrap();
        assert!(reply.score.abs() < f32::EPSILON);
    }

    #[test]
    fn test_feedback_without_score_rejected() {
        assert!(serde_json::from_str::<EvaluatorReply>(r#"{"strengths": "ok"}"#).is_err());
        assert!(serde_json::from_str::<EvaluatorReply>(r#"{"score": "great"}"#).is_err());
    }

    #[test]
    fn test_feedback_serializes_camel_case() {
        let mut record = FeedbackRecord::fallback();
        record.model_used = Some("gemini-2.5-flash".to_string());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["idealAnswerHint"], "Explain the concept clearly with an example.");
        assert_eq!(json["modelUsed"], "gemini-2.5-flash");
        assert_eq!(json["fallback"], true);

        let back: FeedbackRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert!(back.fallback);
    }

    #[test]
    fn test_status_names() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(SessionStatus::parse("completed"), Some(SessionStatus::Completed));
    }
}
