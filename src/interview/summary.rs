//! Aggregate feedback over a finished interview

use serde::Serialize;

use super::types::AnswerRecord;

/// Score at or above which an answer counts as strong
pub const STRONG_ANSWER_SCORE: f32 = 7.0;

/// Maximum number of strengths or improvements listed
const MAX_HIGHLIGHTS: usize = 5;

/// Overall performance band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceLevel {
    #[must_use]
    pub fn from_average(average: f32) -> Self {
        if average >= 8.0 {
            Self::Excellent
        } else if average >= 6.0 {
            Self::Good
        } else if average >= 4.0 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl std::fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary statistics over the evaluated answers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    /// Answers that received feedback
    pub total: usize,
    /// Answers recorded without feedback
    pub unevaluated: usize,
    /// Mean score, rounded to one decimal
    pub average_score: f32,
    pub strong_answers: usize,
    pub needs_improvement: usize,
    pub level: PerformanceLevel,
    pub top_strengths: Vec<String>,
    pub top_improvements: Vec<String>,
}

impl FeedbackSummary {
    #[must_use]
    pub fn from_answers(answers: &[AnswerRecord]) -> Self {
        let scored: Vec<_> = answers.iter().filter_map(|a| a.feedback.as_ref()).collect();
        let total = scored.len();

        #[allow(clippy::cast_precision_loss)]
        let average_score = if total == 0 {
            0.0
        } else {
            let sum: f32 = scored.iter().map(|f| f.score).sum();
            ((sum / total as f32) * 10.0).round() / 10.0
        };

        let strong_answers = scored
            .iter()
            .filter(|f| f.score >= STRONG_ANSWER_SCORE)
            .count();

        Self {
            total,
            unevaluated: answers.len() - total,
            average_score,
            strong_answers,
            needs_improvement: total - strong_answers,
            level: PerformanceLevel::from_average(average_score),
            top_strengths: unique_highlights(scored.iter().map(|f| f.strengths.as_str())),
            top_improvements: unique_highlights(scored.iter().map(|f| f.improvements.as_str())),
        }
    }
}

fn unique_highlights<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for item in items.map(str::trim).filter(|s| !s.is_empty()) {
        if !unique.iter().any(|u| u == item) {
            unique.push(item.to_string());
        }
        if unique.len() == MAX_HIGHLIGHTS {
            break;
        }
    }
    unique
}
