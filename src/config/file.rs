//! TOML configuration file loading
//!
//! Supports `~/.config/interview-coach/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CoachConfigFile {
    /// Data directory override
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Generation model configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Interview pacing and presentation
    #[serde(default)]
    pub interview: InterviewFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Generation model configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LlmFileConfig {
    /// Provider ("gemini" or "openai")
    pub provider: Option<String>,

    /// Ordered candidate chain (first success wins)
    pub models: Option<Vec<String>>,

    /// Base URL override for the provider API
    pub base_url: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VoiceFileConfig {
    /// Enable microphone and speaker
    pub enabled: Option<bool>,

    /// STT provider ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS provider ("openai" or "elevenlabs")
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,
}

/// Interview presentation configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InterviewFileConfig {
    /// Name used in the greeting
    pub candidate_name: Option<String>,

    /// Pause after announcing feedback, in seconds
    pub feedback_pause_secs: Option<u64>,

    /// Upper bound on questions per generated session
    pub max_questions: Option<usize>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiKeysFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepgram: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `CoachConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> CoachConfigFile {
    let Some(path) = config_file_path() else {
        return CoachConfigFile::default();
    };

    load_config_from(&path)
}

/// Load a TOML config file from an explicit path
///
/// Missing or malformed files produce defaults.
pub fn load_config_from(path: &Path) -> CoachConfigFile {
    if !path.exists() {
        return CoachConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                CoachConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            CoachConfigFile::default()
        }
    }
}

/// Write the config file, creating parent directories as needed
///
/// # Errors
///
/// Returns error if serialization or writing fails
pub fn save_config_file(path: &Path, config: &CoachConfigFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| crate::Error::Config(format!("failed to serialize config: {e}")))?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "wrote config file");
    Ok(())
}

/// Return the config file path: `~/.config/interview-coach/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("interview-coach").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_parses() {
        let toml = r#"
            [llm]
            models = ["m1", "m2"]

            [interview]
            feedback_pause_secs = 0
        "#;
        let cfg: CoachConfigFile = toml::from_str(toml).unwrap();
        assert_eq!(cfg.llm.models.unwrap(), vec!["m1", "m2"]);
        assert_eq!(cfg.interview.feedback_pause_secs, Some(0));
        assert!(cfg.voice.enabled.is_none());
    }

    #[test]
    fn test_missing_file_is_default() {
        let cfg = load_config_from(Path::new("/nonexistent/interview-coach.toml"));
        assert!(cfg.llm.provider.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = CoachConfigFile::default();
        cfg.llm.provider = Some("openai".to_string());
        cfg.interview.candidate_name = Some("Sam".to_string());
        save_config_file(&path, &cfg).unwrap();

        let loaded = load_config_from(&path);
        assert_eq!(loaded.llm.provider.as_deref(), Some("openai"));
        assert_eq!(loaded.interview.candidate_name.as_deref(), Some("Sam"));
    }
}
