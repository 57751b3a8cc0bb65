//! Continuous speech capture
//!
//! A [`Recognizer`] pushes [`RecognitionEvent`]s into a channel owned by
//! [`SpeechCapture`], which folds them into the running answer.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::transcript::{RecognitionEvent, TranscriptBuffer, TranscriptSegment};
use crate::Result;

/// Source of recognition events
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Begin a recognition session, sending results to `events`
    ///
    /// # Errors
    ///
    /// Returns error if the underlying device or service cannot be started
    async fn start(&mut self, events: mpsc::UnboundedSender<RecognitionEvent>) -> Result<()>;

    /// End the session
    ///
    /// Once this returns, no further events are sent for the session.
    ///
    /// # Errors
    ///
    /// Returns error if shutdown fails; the session is still considered ended
    async fn stop(&mut self) -> Result<()>;
}

/// Capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Listening,
}

/// Restartable capture that accumulates the candidate's answer
pub struct SpeechCapture {
    recognizer: Box<dyn Recognizer>,
    events_tx: mpsc::UnboundedSender<RecognitionEvent>,
    events_rx: mpsc::UnboundedReceiver<RecognitionEvent>,
    buffer: TranscriptBuffer,
    state: CaptureState,
}

impl SpeechCapture {
    #[must_use]
    pub fn new(recognizer: Box<dyn Recognizer>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            recognizer,
            events_tx,
            events_rx,
            buffer: TranscriptBuffer::new(),
            state: CaptureState::Idle,
        }
    }

    /// Begin listening (no-op if already listening)
    ///
    /// # Errors
    ///
    /// Returns error if the recognizer fails to start
    pub async fn start(&mut self) -> Result<()> {
        if self.state == CaptureState::Listening {
            return Ok(());
        }

        self.recognizer.start(self.events_tx.clone()).await?;
        self.state = CaptureState::Listening;
        tracing::debug!(recognizer = self.recognizer.name(), "capture started");
        Ok(())
    }

    /// Stop listening, keeping everything recognized so far
    ///
    /// The recognizer is stopped before the queue is drained, so every event
    /// of this session is applied by the time this returns.
    pub async fn stop(&mut self) {
        if self.state == CaptureState::Listening {
            if let Err(e) = self.recognizer.stop().await {
                tracing::warn!(
                    recognizer = self.recognizer.name(),
                    error = %e,
                    "recognizer did not stop cleanly"
                );
            }
            self.state = CaptureState::Idle;
            tracing::debug!(recognizer = self.recognizer.name(), "capture stopped");
        }
        self.drain();
    }

    /// Apply all queued events without waiting
    ///
    /// Returns true if any event was applied.
    pub fn drain(&mut self) -> bool {
        let mut applied = false;
        while let Ok(event) = self.events_rx.try_recv() {
            self.buffer.apply(&event);
            applied = true;
        }
        applied
    }

    /// Wait for the next recognition event and apply it
    ///
    /// Returns the answer as it stands afterwards. Pends forever when no
    /// recognizer is running, so it is safe to race against other work.
    pub async fn next_update(&mut self) -> String {
        match self.events_rx.recv().await {
            Some(event) => {
                self.buffer.apply(&event);
                self.buffer.answer()
            }
            // Unreachable while we hold a sender
            None => std::future::pending().await,
        }
    }

    /// Finalized text plus trailing interim
    #[must_use]
    pub fn answer(&self) -> String {
        self.buffer.answer()
    }

    /// Whether nothing has been said yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the answer and discard stale queued events
    pub fn reset(&mut self) {
        while self.events_rx.try_recv().is_ok() {}
        self.buffer.clear();
    }

    #[must_use]
    pub const fn state(&self) -> CaptureState {
        self.state
    }
}

/// Shared handle for pushing typed lines into a [`ConsoleRecognizer`]
#[derive(Debug, Clone, Default)]
pub struct ConsoleFeed {
    sender: Arc<Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>>,
}

impl ConsoleFeed {
    /// Submit a typed line as a final result
    ///
    /// Returns false if no capture session is open and the line was dropped.
    pub fn submit(&self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }

        self.sender
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .is_some_and(|tx| {
                tx.send(RecognitionEvent::single(TranscriptSegment::finalized(line)))
                    .is_ok()
            })
    }

    /// Whether a capture session is currently open
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.sender.lock().is_ok_and(|guard| guard.is_some())
    }
}

/// Recognizer fed by typed console input
#[derive(Debug, Default)]
pub struct ConsoleRecognizer {
    feed: ConsoleFeed,
}

impl ConsoleRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for the input loop
    #[must_use]
    pub fn feed(&self) -> ConsoleFeed {
        self.feed.clone()
    }
}

#[async_trait]
impl Recognizer for ConsoleRecognizer {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn start(&mut self, events: mpsc::UnboundedSender<RecognitionEvent>) -> Result<()> {
        if let Ok(mut guard) = self.feed.sender.lock() {
            *guard = Some(events);
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Ok(mut guard) = self.feed.sender.lock() {
            guard.take();
        }
        Ok(())
    }
}

#[cfg(feature = "audio")]
pub use microphone::MicrophoneRecognizer;

#[cfg(feature = "audio")]
mod microphone {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread::JoinHandle;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::{mpsc, oneshot};

    use super::Recognizer;
    use crate::voice::transcript::{RecognitionEvent, TranscriptSegment};
    use crate::voice::{AudioCapture, SAMPLE_RATE, SpeechToText, UtteranceDetector, samples_to_wav};
    use crate::{Error, Result};

    /// How often the capture buffer is polled
    const POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Microphone recognizer: segments speech by energy and transcribes each utterance
    pub struct MicrophoneRecognizer {
        stt: Arc<SpeechToText>,
        running: Arc<AtomicBool>,
        worker: Option<JoinHandle<()>>,
    }

    impl MicrophoneRecognizer {
        #[must_use]
        pub fn new(stt: SpeechToText) -> Self {
            Self {
                stt: Arc::new(stt),
                running: Arc::new(AtomicBool::new(false)),
                worker: None,
            }
        }
    }

    #[async_trait]
    impl Recognizer for MicrophoneRecognizer {
        fn name(&self) -> &'static str {
            "microphone"
        }

        async fn start(&mut self, events: mpsc::UnboundedSender<RecognitionEvent>) -> Result<()> {
            if self.worker.is_some() {
                return Ok(());
            }

            let (ready_tx, ready_rx) = oneshot::channel();
            let running = Arc::clone(&self.running);
            let stt = Arc::clone(&self.stt);
            let runtime = tokio::runtime::Handle::current();
            running.store(true, Ordering::Release);

            // cpal streams are not Send, so the device lives on its own thread
            let worker = std::thread::spawn(move || {
                let mut capture = match AudioCapture::new().and_then(|mut c| c.start().map(|()| c))
                {
                    Ok(capture) => {
                        let _ = ready_tx.send(Ok(()));
                        capture
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let mut detector = UtteranceDetector::new();
                let transcribe = |samples: Vec<f32>| {
                    let text = samples_to_wav(&samples, SAMPLE_RATE)
                        .and_then(|wav| runtime.block_on(stt.transcribe(&wav)));
                    match text {
                        Ok(text) if !text.trim().is_empty() => {
                            let _ = events.send(RecognitionEvent::single(
                                TranscriptSegment::finalized(text.trim()),
                            ));
                        }
                        Ok(_) => tracing::debug!("utterance produced no text"),
                        Err(e) => tracing::warn!(error = %e, "transcription failed"),
                    }
                };

                while running.load(Ordering::Acquire) {
                    std::thread::sleep(POLL_INTERVAL);
                    if let Some(utterance) = detector.process(&capture.take_buffer()) {
                        transcribe(utterance);
                    }
                }

                capture.stop();
                if let Some(utterance) = detector.process(&capture.take_buffer()) {
                    transcribe(utterance);
                }
                if let Some(pending) = detector.flush() {
                    transcribe(pending);
                }
            });

            match ready_rx.await {
                Ok(Ok(())) => {
                    self.worker = Some(worker);
                    tracing::info!("microphone listening");
                    Ok(())
                }
                Ok(Err(e)) => {
                    self.running.store(false, Ordering::Release);
                    let _ = worker.join();
                    Err(e)
                }
                Err(_) => {
                    self.running.store(false, Ordering::Release);
                    Err(Error::Audio("capture thread exited during startup".to_string()))
                }
            }
        }

        async fn stop(&mut self) -> Result<()> {
            self.running.store(false, Ordering::Release);
            let Some(worker) = self.worker.take() else {
                return Ok(());
            };

            // Joining waits for the final flush, so no event follows this call
            tokio::task::spawn_blocking(move || worker.join())
                .await
                .map_err(|e| Error::Audio(e.to_string()))?
                .map_err(|_| Error::Audio("capture thread panicked".to_string()))?;

            tracing::info!("microphone stopped");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_lines_become_answer() {
        let recognizer = ConsoleRecognizer::new();
        let feed = recognizer.feed();
        let mut capture = SpeechCapture::new(Box::new(recognizer));

        assert!(!feed.submit("dropped while idle"));
        capture.start().await.unwrap();
        assert_eq!(capture.state(), CaptureState::Listening);

        assert!(feed.submit("first line"));
        assert!(feed.submit("second line"));
        capture.stop().await;

        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(capture.answer(), "first line second line");
        assert!(!feed.is_open());
    }

    #[tokio::test]
    async fn test_reset_discards_everything() {
        let recognizer = ConsoleRecognizer::new();
        let feed = recognizer.feed();
        let mut capture = SpeechCapture::new(Box::new(recognizer));

        capture.start().await.unwrap();
        feed.submit("applied");
        assert!(capture.drain());
        feed.submit("queued");
        capture.reset();

        assert!(capture.is_empty());
        assert!(!capture.drain());
    }
}
