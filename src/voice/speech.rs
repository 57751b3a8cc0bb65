//! Interviewer speech output
//!
//! [`SpeechPlayback`] turns each line into an awaitable utterance and keeps at
//! most one in flight. The actual output goes through a [`SpeechSink`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::Result;

/// Shared cancellation flag for one utterance
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Something that can voice (or display) an interviewer line
#[async_trait]
pub trait SpeechSink: Send + Sync {
    /// Output `text`, returning when it has finished or `cancel` was raised
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn utter(&self, text: &str, cancel: &CancelFlag) -> Result<()>;
}

/// One-at-a-time speech output
pub struct SpeechPlayback {
    sink: Arc<dyn SpeechSink>,
    active: Mutex<Option<CancelFlag>>,
}

impl SpeechPlayback {
    #[must_use]
    pub fn new(sink: Arc<dyn SpeechSink>) -> Self {
        Self {
            sink,
            active: Mutex::new(None),
        }
    }

    /// Speak `text`, cancelling any utterance still in flight
    ///
    /// Completes when the utterance ends or is cancelled.
    ///
    /// # Errors
    ///
    /// Returns error if the sink fails
    pub async fn speak(&self, text: &str) -> Result<()> {
        let flag = CancelFlag::new();
        if let Ok(mut active) = self.active.lock()
            && let Some(previous) = active.replace(flag.clone())
        {
            previous.cancel();
        }

        tracing::debug!(text, "speaking");
        let result = self.sink.utter(text, &flag).await;

        if let Ok(mut active) = self.active.lock()
            && active
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(&current.0, &flag.0))
        {
            active.take();
        }

        result
    }

    /// Cancel the utterance in flight, if any
    pub fn cancel(&self) {
        if let Ok(mut active) = self.active.lock()
            && let Some(flag) = active.take()
        {
            flag.cancel();
        }
    }

    /// Whether an utterance is in flight
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.active.lock().is_ok_and(|active| active.is_some())
    }
}

/// Prints interviewer lines to stdout
#[derive(Debug, Default)]
pub struct ConsoleSink;

#[async_trait]
impl SpeechSink for ConsoleSink {
    async fn utter(&self, text: &str, cancel: &CancelFlag) -> Result<()> {
        if !cancel.is_cancelled() {
            println!("Interviewer: {text}");
        }
        Ok(())
    }
}

/// Synthesizes lines with TTS and plays them on the default output device
#[cfg(feature = "audio")]
pub struct VoiceSink {
    tts: super::TextToSpeech,
    playback: Arc<super::AudioPlayback>,
}

#[cfg(feature = "audio")]
impl VoiceSink {
    #[must_use]
    pub fn new(tts: super::TextToSpeech, playback: super::AudioPlayback) -> Self {
        Self {
            tts,
            playback: Arc::new(playback),
        }
    }
}

#[cfg(feature = "audio")]
#[async_trait]
impl SpeechSink for VoiceSink {
    async fn utter(&self, text: &str, cancel: &CancelFlag) -> Result<()> {
        if cancel.is_cancelled() {
            return Ok(());
        }

        let mp3 = self.tts.synthesize(text).await?;
        if cancel.is_cancelled() {
            return Ok(());
        }

        let playback = Arc::clone(&self.playback);
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || playback.play_mp3_blocking(&mp3, &cancel))
            .await
            .map_err(|e| crate::Error::Audio(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    struct HangingSink;

    #[async_trait]
    impl SpeechSink for HangingSink {
        async fn utter(&self, _text: &str, cancel: &CancelFlag) -> Result<()> {
            while !cancel.is_cancelled() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Ok(())
        }
    }

    fn spawn_speak(
        playback: &Arc<SpeechPlayback>,
        text: &'static str,
    ) -> tokio::task::JoinHandle<Result<()>> {
        let playback = Arc::clone(playback);
        tokio::spawn(async move { playback.speak(text).await })
    }

    #[tokio::test]
    async fn test_new_utterance_cancels_previous() {
        let playback = Arc::new(SpeechPlayback::new(Arc::new(HangingSink)));

        let first = spawn_speak(&playback, "first");
        while !playback.is_speaking() {
            tokio::task::yield_now().await;
        }

        let second = spawn_speak(&playback, "second");
        tokio::time::timeout(Duration::from_secs(5), first)
            .await
            .expect("first utterance should end once the second starts")
            .unwrap()
            .unwrap();

        // The second utterance is still the active one
        assert!(playback.is_speaking());
        assert!(!second.is_finished());

        playback.cancel();
        tokio::time::timeout(Duration::from_secs(5), second)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(!playback.is_speaking());
    }

    #[tokio::test]
    async fn test_cancel_ends_utterance() {
        let playback = Arc::new(SpeechPlayback::new(Arc::new(HangingSink)));

        let first = spawn_speak(&playback, "first");
        while !playback.is_speaking() {
            tokio::task::yield_now().await;
        }

        playback.cancel();
        first.await.unwrap().unwrap();
        assert!(!playback.is_speaking());
    }

    #[tokio::test]
    async fn test_console_sink_completes() {
        let playback = SpeechPlayback::new(Arc::new(ConsoleSink));
        playback.speak("Question 1. What is a closure?").await.unwrap();
        assert!(!playback.is_speaking());
    }
}
