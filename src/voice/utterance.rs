//! Energy-based utterance segmentation
//!
//! Splits a continuous microphone stream into spoken segments so each one can
//! be sent to STT as soon as the candidate pauses.

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech worth transcribing (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration that ends an utterance (in samples)
const SILENCE_SAMPLES: usize = 12000; // 0.75 seconds

/// State of the utterance detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Speech in progress, accumulating
    Speaking,
}

/// Segments audio into utterances separated by silence
#[derive(Debug)]
pub struct UtteranceDetector {
    state: DetectorState,
    speech_buffer: Vec<f32>,
    voiced_samples: usize,
    silence_counter: usize,
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceDetector {
    /// Create an idle detector
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DetectorState::Idle,
            speech_buffer: Vec::new(),
            voiced_samples: 0,
            silence_counter: 0,
        }
    }

    /// Feed audio samples
    ///
    /// Returns the completed utterance once enough speech is followed by silence.
    pub fn process(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Speaking;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.voiced_samples = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
            }
            DetectorState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.voiced_samples += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > SILENCE_SAMPLES {
                    if self.voiced_samples > MIN_SPEECH_SAMPLES {
                        tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                        return self.take();
                    }
                    // Too short to be speech (a click or cough)
                    self.reset();
                }
            }
        }

        None
    }

    /// Return any pending speech regardless of trailing silence
    pub fn flush(&mut self) -> Option<Vec<f32>> {
        if self.state == DetectorState::Speaking && self.voiced_samples > MIN_SPEECH_SAMPLES {
            return self.take();
        }
        self.reset();
        None
    }

    /// Reset detector to idle state
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.speech_buffer.clear();
        self.voiced_samples = 0;
        self.silence_counter = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }

    fn take(&mut self) -> Option<Vec<f32>> {
        let utterance = std::mem::take(&mut self.speech_buffer);
        self.reset();
        Some(utterance)
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_calculation() {
        let silence = vec![0.0f32; 100];
        assert!(calculate_energy(&silence) < 0.001);

        let loud = vec![0.5f32; 100];
        assert!(calculate_energy(&loud) > 0.4);
    }

    #[test]
    fn test_speech_then_silence_completes() {
        let mut detector = UtteranceDetector::new();
        assert!(detector.process(&[0.5; 8000]).is_none());
        let utterance = detector.process(&[0.0; SILENCE_SAMPLES + 1]).unwrap();
        assert_eq!(utterance.len(), 8000 + SILENCE_SAMPLES + 1);
        assert_eq!(detector.state(), DetectorState::Idle);
    }

    #[test]
    fn test_flush_returns_pending_speech() {
        let mut detector = UtteranceDetector::new();
        detector.process(&[0.5; 8000]);
        assert_eq!(detector.flush().map(|u| u.len()), Some(8000));
        assert!(detector.flush().is_none());
    }

    #[test]
    fn test_short_noise_discarded() {
        let mut detector = UtteranceDetector::new();
        assert!(detector.process(&[0.5; 1600]).is_none());
        assert_eq!(detector.state(), DetectorState::Speaking);

        assert!(detector.process(&[0.0; SILENCE_SAMPLES + 1]).is_none());
        assert_eq!(detector.state(), DetectorState::Idle);
    }
}
