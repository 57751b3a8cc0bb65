//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;

use interview_coach::voice::{
    ConsoleRecognizer, DetectorState, RecognitionEvent, SAMPLE_RATE, SpeechCapture,
    TranscriptBuffer, TranscriptSegment, UtteranceDetector, samples_to_wav,
};

/// 0.1 s at 16 kHz
const CHUNK: usize = 1600;

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Feed audio in 0.1 s chunks, collecting completed utterances
fn feed(detector: &mut UtteranceDetector, samples: &[f32]) -> Vec<Vec<f32>> {
    samples
        .chunks(CHUNK)
        .filter_map(|chunk| detector.process(chunk))
        .collect()
}

#[test]
fn test_silence_never_starts_utterance() {
    let mut detector = UtteranceDetector::new();

    assert!(feed(&mut detector, &generate_silence(2.0)).is_empty());
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_speech_then_pause_yields_utterance() {
    let mut detector = UtteranceDetector::new();

    assert!(feed(&mut detector, &generate_sine_samples(440.0, 0.5, 0.3)).is_empty());
    assert_eq!(detector.state(), DetectorState::Speaking);

    let utterances = feed(&mut detector, &generate_silence(1.0));
    assert_eq!(utterances.len(), 1);
    // Speech plus the silence that closed it
    assert_eq!(utterances[0].len(), 8000 + 8 * CHUNK);
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_two_utterances_are_separate() {
    let mut detector = UtteranceDetector::new();

    let mut audio = generate_sine_samples(300.0, 0.5, 0.3);
    audio.extend(generate_silence(1.0));
    audio.extend(generate_sine_samples(500.0, 0.6, 0.3));
    audio.extend(generate_silence(1.0));

    assert_eq!(feed(&mut detector, &audio).len(), 2);
}

#[test]
fn test_short_noise_is_discarded() {
    let mut detector = UtteranceDetector::new();

    let mut audio = generate_sine_samples(440.0, 0.1, 0.5);
    audio.extend(generate_silence(1.0));

    assert!(feed(&mut detector, &audio).is_empty());
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_flush_returns_pending_speech() {
    let mut detector = UtteranceDetector::new();

    feed(&mut detector, &generate_sine_samples(440.0, 0.5, 0.3));
    let pending = detector.flush().unwrap();
    assert_eq!(pending.len(), 8000);
    assert!(detector.flush().is_none());
}

#[test]
fn test_transcript_interim_replaced_by_final() {
    let mut buffer = TranscriptBuffer::new();

    buffer.apply(&RecognitionEvent::single(TranscriptSegment::interim("a clo")));
    assert_eq!(buffer.answer(), "a clo");

    buffer.apply(&RecognitionEvent::single(TranscriptSegment::interim("a closure cap")));
    assert_eq!(buffer.interim(), "a closure cap");
    assert!(buffer.finalized().is_empty());

    buffer.apply(&RecognitionEvent::single(TranscriptSegment::finalized(
        "a closure captures",
    )));
    assert_eq!(buffer.finalized(), "a closure captures");
    assert!(buffer.interim().is_empty());

    buffer.apply(&RecognitionEvent::single(TranscriptSegment::interim("its scope")));
    assert_eq!(buffer.answer(), "a closure captures its scope");
}

#[test]
fn test_transcript_skips_already_applied_results() {
    let mut buffer = TranscriptBuffer::new();

    buffer.apply(&RecognitionEvent {
        result_index: 0,
        results: vec![TranscriptSegment::finalized("first")],
    });
    buffer.apply(&RecognitionEvent {
        result_index: 1,
        results: vec![
            TranscriptSegment::finalized("first"),
            TranscriptSegment::finalized("second"),
        ],
    });

    assert_eq!(buffer.answer(), "first second");
}

#[test]
fn test_whitespace_only_transcript_is_empty() {
    let mut buffer = TranscriptBuffer::new();
    buffer.apply(&RecognitionEvent::single(TranscriptSegment::interim("   ")));
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn test_capture_reset_discards_stale_events() {
    let recognizer = ConsoleRecognizer::new();
    let feed = recognizer.feed();
    let mut capture = SpeechCapture::new(Box::new(recognizer));

    capture.start().await.unwrap();
    feed.submit("answer to the previous question");
    capture.reset();

    assert!(!capture.drain());
    assert!(capture.is_empty());

    feed.submit("fresh answer");
    assert_eq!(capture.next_update().await, "fresh answer");
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    // 44 byte header plus 16-bit samples
    assert!(wav_data.len() >= 44 + samples.len() * 2);
}

#[test]
fn test_wav_readback() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, SAMPLE_RATE).unwrap();

    let cursor = Cursor::new(wav_data);
    let mut reader = hound::WavReader::new(cursor).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), original_samples.len());
    assert_eq!(read_samples[3], i16::MAX);
}
