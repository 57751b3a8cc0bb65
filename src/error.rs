//! Error types for the interview coach

use thiserror::Error;

/// Result type alias for interview coach operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or conducting an interview
#[derive(Debug, Error)]
pub enum Error {
    /// Required input missing or out of range, rejected before any network call
    #[error("validation error: {0}")]
    Validation(String),

    /// Every candidate in the model chain failed
    #[error("all models exhausted (tried: {})", attempted.join(", "))]
    AllModelsExhausted {
        /// Candidates that were attempted, in order
        attempted: Vec<String>,
    },

    /// A single generation request failed
    #[error("generation error: {0}")]
    Generation(String),

    /// Model output did not match the expected structure
    #[error("parse error: {0}")]
    Parse(String),

    /// Downstream save or lookup failed
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Requested transition is not valid in the current phase
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Machine-readable error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid input
    Validation,
    /// No model could serve the request
    ServiceUnavailable,
    /// Model returned non-conforming output
    ParseFailure,
    /// Storage collaborator failed
    Persistence,
    /// Operation not allowed in the current interview phase
    InvalidState,
    /// Microphone, speaker, STT or TTS failure
    Voice,
    /// Missing or malformed configuration
    Configuration,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Stable identifier, e.g. for logs or API payloads
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::ServiceUnavailable => "ALL_MODELS_FAILED",
            Self::ParseFailure => "PARSE_FAILURE",
            Self::Persistence => "PERSISTENCE_FAILURE",
            Self::InvalidState => "INVALID_STATE",
            Self::Voice => "VOICE_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Short message suitable for showing to the candidate
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::Validation => "Some required information is missing.",
            Self::ServiceUnavailable => {
                "The feedback service is unavailable right now. Please try again later."
            }
            Self::ParseFailure => "The AI returned a response we could not understand.",
            Self::Persistence => "Your progress could not be saved.",
            Self::InvalidState => "That action is not available right now.",
            Self::Voice => "There was a problem with the microphone or speaker.",
            Self::Configuration => "The interview coach is not configured correctly.",
            Self::Internal => "Something went wrong.",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::AllModelsExhausted { .. } => ErrorKind::ServiceUnavailable,
            Self::Parse(_) | Self::Serialization(_) => ErrorKind::ParseFailure,
            Self::Persistence(_)
            | Self::Database(_)
            | Self::Sqlite(_)
            | Self::NotFound(_) => ErrorKind::Persistence,
            Self::InvalidTransition(_) => ErrorKind::InvalidState,
            Self::Audio(_) | Self::Stt(_) | Self::Tts(_) => ErrorKind::Voice,
            Self::Config(_) | Self::Toml(_) => ErrorKind::Configuration,
            Self::Generation(_) | Self::Io(_) | Self::Http(_) => ErrorKind::Internal,
        }
    }

    /// Optional human-readable detail, separate from the user-facing wording
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::AllModelsExhausted { attempted } if attempted.is_empty() => None,
            _ => Some(self.to_string()),
        }
    }
}
