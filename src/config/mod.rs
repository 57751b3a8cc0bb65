//! Configuration management for the interview coach

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::llm::LlmProvider;
use crate::voice::{SttProvider, TtsProvider};
use crate::{Error, Result};

/// Default candidate chain, tried in order
pub const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash-lite", "gemini-2.5-flash", "gemini-3-flash"];

/// Default upper bound on generated questions
pub const DEFAULT_MAX_QUESTIONS: usize = 20;

/// Interview coach configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (database)
    pub data_dir: PathBuf,

    /// Generation model configuration
    pub llm: LlmConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Interview presentation configuration
    pub interview: InterviewConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Generation model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which API shape to speak
    pub provider: LlmProvider,

    /// Ordered candidate chain
    pub models: Vec<String>,

    /// Base URL override (defaults to the provider's public endpoint)
    pub base_url: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Use microphone and speaker (otherwise console text)
    pub enabled: bool,

    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS backend
    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1", "eleven_monolingual_v1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

/// Interview presentation configuration
#[derive(Debug, Clone)]
pub struct InterviewConfig {
    /// Name used in the greeting
    pub candidate_name: String,

    /// Pause after "Here is your feedback."
    pub feedback_pause: Duration,

    /// Upper bound on questions per generated session
    pub max_questions: usize,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            candidate_name: "Candidate".to_string(),
            feedback_pause: Duration::from_secs(3),
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Google Gemini API key
    pub gemini: Option<SecretString>,

    /// `OpenAI` API key (chat, Whisper and TTS)
    pub openai: Option<SecretString>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<SecretString>,
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        let config = Self::resolve(fc, &|key| std::env::var(key).ok())?;

        std::fs::create_dir_all(&config.data_dir).ok();
        Ok(config)
    }

    /// Load configuration with voice forced off
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        let mut config = Self::load()?;
        if disable_voice {
            tracing::info!("voice explicitly disabled via --text");
            config.voice.enabled = false;
        }
        Ok(config)
    }

    /// Merge a config file with an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the provider names are unknown or the candidate chain is empty
    pub fn resolve(
        fc: file::CoachConfigFile,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let secret = |key: &str, fallback: Option<String>| {
            env(key)
                .or(fallback)
                .filter(|k| !k.is_empty())
                .map(SecretString::from)
        };

        let api_keys = ApiKeys {
            gemini: secret("GEMINI_API_KEY", fc.api_keys.gemini),
            openai: secret("OPENAI_API_KEY", fc.api_keys.openai),
            elevenlabs: secret("ELEVENLABS_API_KEY", fc.api_keys.elevenlabs),
            deepgram: secret("DEEPGRAM_API_KEY", fc.api_keys.deepgram),
        };

        let provider_name = env("COACH_LLM_PROVIDER")
            .or(fc.llm.provider)
            .unwrap_or_else(|| "gemini".to_string());
        let provider = LlmProvider::parse(&provider_name)
            .ok_or_else(|| Error::Config(format!("unknown LLM provider: {provider_name}")))?;

        let models: Vec<String> = env("COACH_MODELS")
            .map(|s| {
                s.split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect()
            })
            .or(fc.llm.models)
            .unwrap_or_else(|| DEFAULT_MODELS.iter().map(ToString::to_string).collect());

        if models.is_empty() {
            return Err(Error::Config("model candidate chain is empty".to_string()));
        }

        let llm = LlmConfig {
            provider,
            models,
            base_url: env("COACH_LLM_BASE_URL").or(fc.llm.base_url),
        };

        let stt_name = fc.voice.stt_provider.unwrap_or_else(|| "whisper".to_string());
        let stt_provider = SttProvider::parse(&stt_name)
            .ok_or_else(|| Error::Config(format!("unknown STT provider: {stt_name}")))?;
        let tts_name = fc.voice.tts_provider.unwrap_or_else(|| "openai".to_string());
        let tts_provider = TtsProvider::parse(&tts_name)
            .ok_or_else(|| Error::Config(format!("unknown TTS provider: {tts_name}")))?;

        let voice = VoiceConfig {
            enabled: fc.voice.enabled.unwrap_or(true),
            stt_provider,
            stt_model: env("COACH_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| stt_provider.default_model().to_string()),
            tts_provider,
            tts_model: env("COACH_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| tts_provider.default_model().to_string()),
            tts_voice: fc.voice.tts_voice.unwrap_or_else(|| "alloy".to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0).clamp(0.25, 4.0),
        };

        let defaults = InterviewConfig::default();
        let interview = InterviewConfig {
            candidate_name: env("COACH_CANDIDATE_NAME")
                .or(fc.interview.candidate_name)
                .unwrap_or(defaults.candidate_name),
            feedback_pause: fc
                .interview
                .feedback_pause_secs
                .map_or(defaults.feedback_pause, Duration::from_secs),
            max_questions: fc
                .interview
                .max_questions
                .unwrap_or(defaults.max_questions),
        };

        // Data directory (~/.local/share/interview-coach on Linux)
        let data_dir = env("COACH_DATA_DIR")
            .or(fc.data_dir)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        Ok(Self {
            data_dir,
            llm,
            voice,
            interview,
            api_keys,
        })
    }

    /// API key for the configured generation provider
    #[must_use]
    pub const fn llm_api_key(&self) -> Option<&SecretString> {
        match self.llm.provider {
            LlmProvider::Gemini => self.api_keys.gemini.as_ref(),
            LlmProvider::OpenAi => self.api_keys.openai.as_ref(),
        }
    }

    /// Path of the `SQLite` database file
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("interviews.db")
    }
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("interview-coach"))
}
