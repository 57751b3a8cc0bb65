//! Running transcript assembled from recognition events

/// One recognition hypothesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptSegment {
    #[must_use]
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    #[must_use]
    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// A batch of results from a recognizer
///
/// `results` is the recognizer's full result list for the current session;
/// only entries at `result_index` and later are new.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionEvent {
    pub result_index: usize,
    pub results: Vec<TranscriptSegment>,
}

impl RecognitionEvent {
    /// Event carrying a single new segment
    #[must_use]
    pub fn single(segment: TranscriptSegment) -> Self {
        Self {
            result_index: 0,
            results: vec![segment],
        }
    }
}

/// Finalized answer text plus the latest interim hypothesis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptBuffer {
    finalized: String,
    interim: String,
}

impl TranscriptBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one recognition event into the buffer
    ///
    /// Final results are appended to the answer and clear the interim buffer.
    /// Otherwise the interim buffer is replaced by the event's hypotheses.
    pub fn apply(&mut self, event: &RecognitionEvent) {
        let mut final_text = String::new();
        let mut interim_text = String::new();

        for segment in event.results.iter().skip(event.result_index) {
            if segment.is_final {
                final_text.push_str(&segment.text);
                final_text.push(' ');
            } else {
                interim_text.push_str(&segment.text);
            }
        }

        if final_text.is_empty() {
            self.interim = interim_text;
        } else {
            self.finalized = format!("{} {}", self.finalized, final_text)
                .trim()
                .to_string();
            self.interim.clear();
        }
    }

    /// Text finalized so far
    #[must_use]
    pub fn finalized(&self) -> &str {
        &self.finalized
    }

    /// Latest interim hypothesis
    #[must_use]
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// The answer as it stands: finalized text plus trailing interim, trimmed
    #[must_use]
    pub fn answer(&self) -> String {
        format!("{} {}", self.finalized, self.interim)
            .trim()
            .to_string()
    }

    /// Whether the answer has any non-whitespace content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.finalized.trim().is_empty() && self.interim.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.finalized.clear();
        self.interim.clear();
    }
}
