//! Voice processing module
//!
//! Speech capture (recognizer events folded into a running answer) and speech
//! playback (interviewer lines as awaitable utterances). Microphone and speaker
//! access require the `audio` feature; console implementations are always
//! available.

mod capture;
#[cfg(feature = "audio")]
mod playback;
mod recognition;
mod speech;
mod stt;
mod transcript;
mod tts;
mod utterance;

#[cfg(feature = "audio")]
pub use capture::AudioCapture;
pub use capture::{SAMPLE_RATE, samples_to_wav};
#[cfg(feature = "audio")]
pub use playback::AudioPlayback;
#[cfg(feature = "audio")]
pub use recognition::MicrophoneRecognizer;
pub use recognition::{CaptureState, ConsoleFeed, ConsoleRecognizer, Recognizer, SpeechCapture};
#[cfg(feature = "audio")]
pub use speech::VoiceSink;
pub use speech::{CancelFlag, ConsoleSink, SpeechPlayback, SpeechSink};
pub use stt::{SpeechToText, SttProvider};
pub use transcript::{RecognitionEvent, TranscriptBuffer, TranscriptSegment};
pub use tts::{TextToSpeech, TtsProvider};
pub use utterance::{DetectorState, UtteranceDetector};
