//! Model chain, output parsing and question generation tests

mod common;

use std::sync::Arc;

use common::{GOOD_FEEDBACK, ScriptedBackend, caller};
use interview_coach::interview::{EvaluatorReply, GenerationRequest};
use interview_coach::llm::parser;
use interview_coach::{Error, FeedbackService, QuestionGenerator};

const QUESTIONS: &str = r#"[
    {"question": "What is ownership?", "answer": "Each value has one owner."},
    {"question": "What is a lifetime?", "answer": "The scope a reference is valid for."},
    {"question": "What is a trait object?", "answer": "Dynamic dispatch via a vtable."}
]"#;

fn request(count: usize) -> GenerationRequest {
    GenerationRequest {
        role: "Rust Developer".to_string(),
        experience_level: "2 years".to_string(),
        topics: vec!["ownership".to_string(), "traits".to_string()],
        count,
    }
}

#[tokio::test]
async fn test_chain_falls_through_to_working_model() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("b", "   ")
            .reply("c", GOOD_FEEDBACK),
    );
    let caller = caller(&backend, &["a", "b", "c"]);

    let response = caller.call("evaluate").await.unwrap();
    assert_eq!(response.model_used, "c");
    assert_eq!(response.text, GOOD_FEEDBACK);
    // Each candidate tried exactly once, in order
    assert_eq!(backend.calls(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_chain_stops_at_first_success() {
    let backend = Arc::new(ScriptedBackend::new().reply("a", "ok").reply("b", "also ok"));
    let caller = caller(&backend, &["a", "b"]);

    assert_eq!(caller.call("hi").await.unwrap().model_used, "a");
    assert_eq!(backend.calls(), vec!["a"]);
}

#[tokio::test]
async fn test_chain_exhausted() {
    let backend = Arc::new(ScriptedBackend::new());
    let caller = caller(&backend, &["a", "b"]);

    let err = caller.call("hi").await.unwrap_err();
    match err {
        Error::AllModelsExhausted { attempted } => assert_eq!(attempted, vec!["a", "b"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_fenced_output_parses_like_bare_output() {
    let bare: EvaluatorReply = parser::parse(GOOD_FEEDBACK).unwrap();
    for wrapped in [
        format!("```json\n{GOOD_FEEDBACK}\n```"),
        format!("```JSON{GOOD_FEEDBACK}```"),
        format!("```\n{GOOD_FEEDBACK}\n```\n"),
        format!("Here is the evaluation:\n{GOOD_FEEDBACK}\nHope this helps."),
    ] {
        let parsed: EvaluatorReply = parser::parse(&wrapped).unwrap();
        assert_eq!(parsed, bare);
    }
}

#[test]
fn test_prose_fails_to_parse() {
    let err = parser::parse::<EvaluatorReply>("I'd rate this answer highly.").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));

    let parsed = parser::parse_or("no json here", EvaluatorReply::fallback);
    assert!(parsed.is_fallback());
}

#[tokio::test]
async fn test_evaluation_provenance_comes_from_the_chain() {
    let reply = r#"{"score": 7, "strengths": "ok", "improvements": "more", "idealAnswerHint": "x",
        "fallback": true, "modelUsed": "invented"}"#;
    let backend = Arc::new(ScriptedBackend::new().reply("b", reply));
    let service = FeedbackService::new(caller(&backend, &["a", "b"]));

    let record = service
        .evaluate("What is a closure?", "A function with state", "Rust Developer", "2 years")
        .await
        .unwrap();

    assert!(!record.fallback);
    assert_eq!(record.model_used.as_deref(), Some("b"));
    assert!((record.score - 7.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_generator_validates_before_calling() {
    let backend = Arc::new(ScriptedBackend::new().reply("a", QUESTIONS));
    let generator = QuestionGenerator::new(caller(&backend, &["a"])).with_max_questions(10);

    let mut blank_role = request(3);
    blank_role.role = "  ".to_string();
    let mut no_topics = request(3);
    no_topics.topics = vec![String::new()];

    for bad in [blank_role, no_topics, request(0), request(11)] {
        let err = generator.generate(&bad).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
    }
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_generator_truncates_and_assigns_ids() {
    let fenced = format!("```json\n{QUESTIONS}\n```");
    let backend = Arc::new(ScriptedBackend::new().reply("a", &fenced));
    let generator = QuestionGenerator::new(caller(&backend, &["a"]));

    let questions = generator.generate(&request(2)).await.unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].text, "What is ownership?");
    assert_eq!(questions[1].reference_answer, "The scope a reference is valid for.");
    assert_ne!(questions[0].id, questions[1].id);
}

#[tokio::test]
async fn test_generator_accepts_fewer_questions() {
    let backend = Arc::new(ScriptedBackend::new().reply("a", QUESTIONS));
    let generator = QuestionGenerator::new(caller(&backend, &["a"]));

    let questions = generator.generate(&request(5)).await.unwrap();
    assert_eq!(questions.len(), 3);
}

#[tokio::test]
async fn test_generator_rejects_empty_list() {
    let backend = Arc::new(ScriptedBackend::new().reply("a", "[]"));
    let generator = QuestionGenerator::new(caller(&backend, &["a"]));

    let err = generator.generate(&request(2)).await.unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[tokio::test]
async fn test_explain_concept() {
    let reply = r#"```json
{"title": "Ownership", "explanation": "Every value has a single owner that frees it."}
```"#;
    let backend = Arc::new(ScriptedBackend::new().reply("a", reply));
    let generator = QuestionGenerator::new(caller(&backend, &["a"]));

    let explanation = generator.explain("What is ownership?").await.unwrap();
    assert_eq!(explanation.title, "Ownership");

    let err = generator.explain(" ").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
