//! Interview turn-taking
//!
//! The orchestrator owns one [`InterviewSession`] and walks it through
//! `Welcome -> Listening(i) -> Evaluating(i) -> Listening(i+1) | Completed`.
//! Playback, capture and evaluation are awaited one after another; the only
//! concurrency is recognition events arriving while a question is open.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use super::feedback::FeedbackService;
use super::script;
use super::session::{InterviewSession, Phase};
use super::types::{AnswerRecord, FeedbackRecord, InterviewTranscript};
use crate::store::InterviewStore;
use crate::voice::{CaptureState, SpeechCapture, SpeechPlayback};
use crate::{Error, ErrorKind, Result};

/// Progress notifications for a front end
#[derive(Debug, Clone, PartialEq)]
pub enum InterviewEvent {
    PhaseChanged(Phase),
    /// A line the interviewer said
    Spoke(String),
    /// The answer as currently recognized
    Transcript(String),
    /// Advance was refused because nothing has been said
    AnswerRejected { index: usize },
    FeedbackReady { index: usize, feedback: FeedbackRecord },
    FeedbackUnavailable { index: usize },
    PersistenceFailed { operation: &'static str, error: String },
    Completed(InterviewTranscript),
}

/// User intents for [`InterviewOrchestrator::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Submit the current answer and move on
    Advance,
    /// Finish now with the answers collected so far
    End,
}

/// Result of an advance request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The answer was recorded and the interview moved on
    Advanced,
    /// Nothing has been said; state unchanged
    Rejected,
    /// An evaluation is already underway
    Ignored,
}

/// Drives one interview session
pub struct InterviewOrchestrator {
    session: InterviewSession,
    capture: SpeechCapture,
    playback: SpeechPlayback,
    feedback: FeedbackService,
    store: Arc<dyn InterviewStore>,
    events: Option<mpsc::UnboundedSender<InterviewEvent>>,
    feedback_pause: Duration,
    transcript: Option<InterviewTranscript>,
}

impl InterviewOrchestrator {
    #[must_use]
    pub fn new(
        session: InterviewSession,
        capture: SpeechCapture,
        playback: SpeechPlayback,
        feedback: FeedbackService,
        store: Arc<dyn InterviewStore>,
    ) -> Self {
        Self {
            session,
            capture,
            playback,
            feedback,
            store,
            events: None,
            feedback_pause: Duration::from_secs(3),
            transcript: None,
        }
    }

    /// Send progress events to `events`
    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<InterviewEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Pause after announcing feedback
    #[must_use]
    pub const fn with_feedback_pause(mut self, pause: Duration) -> Self {
        self.feedback_pause = pause;
        self
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.session.phase()
    }

    #[must_use]
    pub const fn session(&self) -> &InterviewSession {
        &self.session
    }

    /// The completion payload, once the interview has finished
    #[must_use]
    pub const fn transcript(&self) -> Option<&InterviewTranscript> {
        self.transcript.as_ref()
    }

    /// Greet the candidate and ask the first question
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless in `Welcome`, or a voice
    /// error if capture cannot be opened
    pub async fn start(&mut self) -> Result<()> {
        if self.phase() != Phase::Welcome {
            return Err(Error::InvalidTransition(format!(
                "cannot start from {}",
                self.phase()
            )));
        }

        tracing::info!(
            session = %self.session.id(),
            questions = self.session.questions().len(),
            "interview starting"
        );

        let greeting = script::greeting(self.session.context());
        self.say(&greeting).await;
        self.ask(0).await
    }

    /// Submit the current answer
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] in `Welcome` or `Completed`, or a
    /// voice error if capture cannot be reopened for the next question
    pub async fn advance(&mut self) -> Result<AdvanceOutcome> {
        let index = match self.phase() {
            Phase::Listening(i) => i,
            Phase::Evaluating(i) => {
                tracing::debug!(index = i, "advance ignored while evaluating");
                return Ok(AdvanceOutcome::Ignored);
            }
            phase @ (Phase::Welcome | Phase::Completed) => {
                return Err(Error::InvalidTransition(format!(
                    "cannot advance from {phase}"
                )));
            }
        };

        // Recognizers may only finalize pending speech when stopped
        self.capture.stop().await;
        if self.capture.is_empty() {
            tracing::info!(index, "advance rejected: empty answer");
            self.emit(InterviewEvent::AnswerRejected { index });
            self.capture.start().await?;
            return Ok(AdvanceOutcome::Rejected);
        }

        let answer_text = self.capture.answer();
        self.set_phase(Phase::Evaluating(index));

        let Some(question) = self.session.question(index).cloned() else {
            return Err(Error::InvalidTransition(format!(
                "question {index} does not exist"
            )));
        };

        self.say(script::ACKNOWLEDGEMENT).await;

        let context = self.session.context();
        let feedback = match self
            .feedback
            .evaluate(
                &question.text,
                &answer_text,
                &context.role,
                &context.experience_level,
            )
            .await
        {
            Ok(record) => Some(record),
            Err(e) => {
                if e.kind() == ErrorKind::ServiceUnavailable {
                    tracing::error!(index, error = %e, "feedback unavailable");
                } else {
                    tracing::warn!(index, error = %e, "evaluation failed");
                }
                None
            }
        };

        let record = AnswerRecord {
            question_id: question.id.clone(),
            question_index: index,
            question_text: question.text.clone(),
            expected_answer: question.reference_answer.clone(),
            answer_text,
            feedback: feedback.clone(),
            timestamp: Utc::now(),
        };
        self.session.push_answer(record.clone());

        if let Err(e) = self.store.save_answer(self.session.id(), &record).await {
            tracing::warn!(index, error = %e, "failed to save answer");
            self.emit(InterviewEvent::PersistenceFailed {
                operation: "save_answer",
                error: e.to_string(),
            });
        }

        match feedback {
            Some(feedback) => {
                self.emit(InterviewEvent::FeedbackReady { index, feedback });
                self.say(script::FEEDBACK_INTRO).await;
                if !self.feedback_pause.is_zero() {
                    tokio::time::sleep(self.feedback_pause).await;
                }
            }
            None => {
                self.emit(InterviewEvent::FeedbackUnavailable { index });
                self.say(script::FEEDBACK_UNAVAILABLE).await;
            }
        }

        if self.session.is_last(index) {
            self.complete().await;
        } else {
            self.ask(index + 1).await?;
        }

        Ok(AdvanceOutcome::Advanced)
    }

    /// Finish early with the answers collected so far
    ///
    /// Text captured for the open question is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless listening
    pub async fn end(&mut self) -> Result<InterviewTranscript> {
        let Phase::Listening(index) = self.phase() else {
            return Err(Error::InvalidTransition(format!(
                "cannot end from {}",
                self.phase()
            )));
        };

        tracing::info!(index, answered = self.session.answers().len(), "interview ended early");
        self.capture.stop().await;
        self.capture.reset();
        Ok(self.complete().await)
    }

    /// Drive the interview from a command channel until it completes
    ///
    /// Recognition events are applied as they arrive while a question is open.
    /// Advance commands that queue up during an evaluation are dropped.
    ///
    /// # Errors
    ///
    /// Returns error if capture cannot be opened or the command channel closes
    /// before the interview completes
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<Command>,
    ) -> Result<InterviewTranscript> {
        loop {
            if let Some(transcript) = &self.transcript {
                return Ok(transcript.clone());
            }

            let listening = self.capture.state() == CaptureState::Listening;

            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        return Err(Error::InvalidTransition(
                            "command channel closed before the interview completed".to_string(),
                        ));
                    };
                    self.handle(command, &mut commands).await?;
                }
                answer = self.capture.next_update(), if listening => {
                    self.emit(InterviewEvent::Transcript(answer));
                }
            }
        }
    }

    async fn handle(
        &mut self,
        command: Command,
        commands: &mut mpsc::Receiver<Command>,
    ) -> Result<()> {
        match command {
            Command::Start => {
                if self.phase() == Phase::Welcome {
                    self.start().await?;
                } else {
                    tracing::debug!(phase = %self.phase(), "start ignored");
                }
            }
            Command::Advance => {
                match self.advance().await {
                    Ok(AdvanceOutcome::Advanced) => {}
                    Ok(outcome) => tracing::debug!(?outcome, "advance not applied"),
                    Err(Error::InvalidTransition(reason)) => {
                        tracing::debug!(%reason, "advance ignored");
                    }
                    Err(e) => return Err(e),
                }

                // Anything the user pressed while we were evaluating
                let mut end_requested = false;
                while let Ok(queued) = commands.try_recv() {
                    match queued {
                        Command::Advance => tracing::debug!("advance ignored while evaluating"),
                        Command::End => end_requested = true,
                        Command::Start => {}
                    }
                }
                if end_requested && matches!(self.phase(), Phase::Listening(_)) {
                    self.end().await?;
                }
            }
            Command::End => match self.end().await {
                Ok(_) => {}
                Err(Error::InvalidTransition(reason)) => {
                    tracing::debug!(%reason, "end ignored");
                }
                Err(e) => return Err(e),
            },
        }
        Ok(())
    }

    async fn ask(&mut self, index: usize) -> Result<()> {
        let Some(question) = self.session.question(index) else {
            return Err(Error::InvalidTransition(format!(
                "question {index} does not exist"
            )));
        };
        let line = script::question(index, &question.text);

        self.set_phase(Phase::Listening(index));
        self.say(&line).await;
        self.capture.reset();
        self.capture.start().await
    }

    async fn complete(&mut self) -> InterviewTranscript {
        self.set_phase(Phase::Completed);
        self.say(script::CLOSING).await;

        let answers = self.session.answers().to_vec();
        let transcript = InterviewTranscript {
            session_id: self.session.id().to_string(),
            total_answers: answers.len(),
            feedbacks: answers,
            completed_at: Utc::now(),
        };

        if let Err(e) = self.store.save_transcript(&transcript).await {
            tracing::warn!(error = %e, "failed to save transcript");
            self.emit(InterviewEvent::PersistenceFailed {
                operation: "save_transcript",
                error: e.to_string(),
            });
        }

        tracing::info!(
            session = %transcript.session_id,
            total_answers = transcript.total_answers,
            "interview completed"
        );
        self.emit(InterviewEvent::Completed(transcript.clone()));
        self.transcript = Some(transcript.clone());
        transcript
    }

    /// Speak a line; playback failures are logged, never fatal
    async fn say(&self, text: &str) {
        self.emit(InterviewEvent::Spoke(text.to_string()));
        if let Err(e) = self.playback.speak(text).await {
            tracing::warn!(error = %e, "speech playback failed");
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(from = %self.session.phase(), to = %phase, "phase change");
        self.session.set_phase(phase);
        self.emit(InterviewEvent::PhaseChanged(phase));
    }

    fn emit(&self, event: InterviewEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver just means nobody is watching
            let _ = events.send(event);
        }
    }
}
