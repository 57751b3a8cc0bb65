//! Shared test utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use interview_coach::interview::{InterviewContext, InterviewEvent};
use interview_coach::voice::{
    CancelFlag, ConsoleFeed, ConsoleRecognizer, Recognizer, SpeechCapture, SpeechPlayback,
    SpeechSink,
};
use interview_coach::{
    AnswerRecord, DbPool, Error, FeedbackService, GenerationBackend, InterviewOrchestrator,
    InterviewSession, InterviewStore, InterviewTranscript, ModelCaller, Question, Result, db,
};
use tokio::sync::mpsc;

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// A well-formed evaluator response
pub const GOOD_FEEDBACK: &str = r#"{
    "score": 8,
    "strengths": "Correct definition with an example",
    "improvements": "Mention how captures interact with ownership",
    "idealAnswerHint": "A closure is a function value that captures variables from its scope."
}"#;

/// Build questions from plain text
#[must_use]
pub fn questions(texts: &[&str]) -> Vec<Question> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| Question {
            id: format!("q{i}"),
            text: (*text).to_string(),
            reference_answer: format!("reference {i}"),
        })
        .collect()
}

/// Backend with a fixed reply per model; unknown models fail
#[derive(Default)]
pub struct ScriptedBackend {
    replies: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reply(mut self, model: &str, text: &str) -> Self {
        self.replies.insert(model.to_string(), text.to_string());
        self
    }

    /// Models asked so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, model: &str, _prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(model.to_string());
        self.replies
            .get(model)
            .cloned()
            .ok_or_else(|| Error::Generation(format!("{model} unavailable")))
    }
}

/// Caller over `backend` with the given candidate chain
pub fn caller(backend: &Arc<ScriptedBackend>, models: &[&str]) -> ModelCaller {
    let backend: Arc<dyn GenerationBackend> = backend.clone();
    ModelCaller::new(backend, models.iter().map(ToString::to_string).collect())
        .expect("non-empty chain")
}

/// Sink that records every line instead of playing it
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSink for RecordingSink {
    async fn utter(&self, text: &str, _cancel: &CancelFlag) -> Result<()> {
        self.lines.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// In-memory store, optionally failing every write
#[derive(Default)]
pub struct MemoryStore {
    pub answers: Mutex<Vec<AnswerRecord>>,
    pub transcripts: Mutex<Vec<InterviewTranscript>>,
    pub failing: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn get_session(&self, session_id: &str) -> Result<interview_coach::interview::SessionDetails> {
        Err(Error::NotFound(format!("session {session_id}")))
    }

    async fn save_answer(&self, _session_id: &str, record: &AnswerRecord) -> Result<()> {
        if self.failing {
            return Err(Error::Persistence("disk full".to_string()));
        }
        self.answers.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn save_transcript(&self, transcript: &InterviewTranscript) -> Result<()> {
        if self.failing {
            return Err(Error::Persistence("disk full".to_string()));
        }
        self.transcripts.lock().unwrap().push(transcript.clone());
        Ok(())
    }
}

/// An orchestrator wired to console input and recording output
pub struct Harness {
    pub orchestrator: InterviewOrchestrator,
    pub feed: ConsoleFeed,
    pub sink: Arc<RecordingSink>,
    pub store: Arc<MemoryStore>,
    pub backend: Arc<ScriptedBackend>,
    pub events: mpsc::UnboundedReceiver<InterviewEvent>,
}

impl Harness {
    pub fn new(texts: &[&str], backend: ScriptedBackend, models: &[&str]) -> Self {
        Self::with_store(texts, backend, models, MemoryStore::default())
    }

    pub fn with_store(
        texts: &[&str],
        backend: ScriptedBackend,
        models: &[&str],
        store: MemoryStore,
    ) -> Self {
        let recognizer = ConsoleRecognizer::new();
        let feed = recognizer.feed();
        Self::build(texts, backend, models, store, Box::new(recognizer), feed)
    }

    /// Harness listening through `recognizer`; `feed` is left unconnected
    pub fn with_recognizer(
        texts: &[&str],
        backend: ScriptedBackend,
        models: &[&str],
        recognizer: Box<dyn Recognizer>,
    ) -> Self {
        Self::build(
            texts,
            backend,
            models,
            MemoryStore::default(),
            recognizer,
            ConsoleFeed::default(),
        )
    }

    fn build(
        texts: &[&str],
        backend: ScriptedBackend,
        models: &[&str],
        store: MemoryStore,
        recognizer: Box<dyn Recognizer>,
        feed: ConsoleFeed,
    ) -> Self {
        let context = InterviewContext {
            candidate_name: "Ada".to_string(),
            role: "Rust Developer".to_string(),
            experience_level: "2 years".to_string(),
        };
        let session = InterviewSession::new("session-1", context, questions(texts))
            .expect("valid session");

        let backend = Arc::new(backend);
        let sink = Arc::new(RecordingSink::default());
        let store = Arc::new(store);
        let (events_tx, events) = mpsc::unbounded_channel();

        let sink_dyn: Arc<dyn SpeechSink> = sink.clone();
        let store_dyn: Arc<dyn InterviewStore> = store.clone();
        let orchestrator = InterviewOrchestrator::new(
            session,
            SpeechCapture::new(recognizer),
            SpeechPlayback::new(sink_dyn),
            FeedbackService::new(caller(&backend, models)),
            store_dyn,
        )
        .with_events(events_tx)
        .with_feedback_pause(Duration::ZERO);

        Self {
            orchestrator,
            feed,
            sink,
            store,
            backend,
            events,
        }
    }

    /// Everything emitted so far
    pub fn drain_events(&mut self) -> Vec<InterviewEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}
