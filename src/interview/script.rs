//! Lines spoken by the interviewer

use super::types::InterviewContext;

pub const ACKNOWLEDGEMENT: &str = "Thank you. Let me evaluate your answer.";

pub const FEEDBACK_INTRO: &str = "Here is your feedback.";

pub const FEEDBACK_UNAVAILABLE: &str =
    "Feedback is unavailable for this answer right now. Let's continue.";

pub const CLOSING: &str =
    "Excellent work! Your interview is now complete. Please review your detailed feedback below.";

#[must_use]
pub fn greeting(context: &InterviewContext) -> String {
    format!(
        "Hello {}, welcome to your {} interview. I'll be your interviewer today. Let's begin.",
        context.candidate_name, context.role
    )
}

/// `index` is zero-based; the spoken number is one-based
#[must_use]
pub fn question(index: usize, text: &str) -> String {
    format!("Question {}. {text}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        let context = InterviewContext {
            candidate_name: "Ada".to_string(),
            role: "Backend Engineer".to_string(),
            experience_level: "2 years".to_string(),
        };
        assert_eq!(
            greeting(&context),
            "Hello Ada, welcome to your Backend Engineer interview. I'll be your interviewer today. Let's begin."
        );
        assert_eq!(question(0, "What is a closure?"), "Question 1. What is a closure?");
    }
}
