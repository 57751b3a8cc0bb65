//! Interactive setup wizard (`coach setup`)

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use crate::config::DEFAULT_MODELS;
use crate::config::file::{
    self, CoachConfigFile, InterviewFileConfig, LlmFileConfig, VoiceFileConfig,
};

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Interview Coach Setup\n");

    let existing = file::load_config_file();
    let config_path = file::config_file_path()
        .unwrap_or_else(|| PathBuf::from("~/.config/interview-coach/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    // 1. Candidate name
    let candidate_name: String = Input::new()
        .with_prompt("Your name (used in the greeting)")
        .default(
            existing
                .interview
                .candidate_name
                .clone()
                .unwrap_or_else(|| "Candidate".to_string()),
        )
        .interact_text()?;

    // 2. LLM provider + API key
    let providers = ["Gemini", "OpenAI"];
    let default_provider = existing
        .llm
        .provider
        .as_deref()
        .and_then(|p| providers.iter().position(|&l| l.eq_ignore_ascii_case(p)))
        .unwrap_or(0);

    let provider_idx = Select::new()
        .with_prompt("Select an LLM provider")
        .items(&providers)
        .default(default_provider)
        .interact()?;
    let provider_name = providers[provider_idx].to_lowercase();

    let mut api_keys = existing.api_keys;
    let (env_hint, slot) = if provider_name == "gemini" {
        ("GEMINI_API_KEY", &mut api_keys.gemini)
    } else {
        ("OPENAI_API_KEY", &mut api_keys.openai)
    };
    prompt_key(&provider_name, env_hint, slot)?;

    // 3. Candidate chain
    let default_chain = existing.llm.models.clone().unwrap_or_else(|| {
        if provider_name == "gemini" {
            DEFAULT_MODELS.iter().map(ToString::to_string).collect()
        } else {
            vec!["gpt-4o-mini".to_string(), "gpt-4o".to_string()]
        }
    });

    let chain: String = Input::new()
        .with_prompt("Models to try, in order (comma separated)")
        .default(default_chain.join(", "))
        .interact_text()?;
    let models: Vec<String> = chain
        .split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();

    // 4. Voice (optional)
    let enable_voice = Confirm::new()
        .with_prompt("Use microphone and speaker (STT/TTS)?")
        .default(existing.voice.enabled.unwrap_or(true))
        .interact()?;

    let voice = if enable_voice {
        if api_keys.openai.is_none() {
            let need_openai = Confirm::new()
                .with_prompt("Voice uses OpenAI Whisper/TTS. Add an OpenAI key?")
                .default(true)
                .interact()?;
            if need_openai {
                prompt_key("openai", "OPENAI_API_KEY", &mut api_keys.openai)?;
            }
        }

        VoiceFileConfig {
            enabled: Some(true),
            stt_model: Some(
                existing
                    .voice
                    .stt_model
                    .unwrap_or_else(|| "whisper-1".to_string()),
            ),
            tts_model: Some(existing.voice.tts_model.unwrap_or_else(|| "tts-1".to_string())),
            tts_voice: Some(existing.voice.tts_voice.unwrap_or_else(|| "alloy".to_string())),
            tts_speed: existing.voice.tts_speed.or(Some(1.0)),
            ..existing.voice
        }
    } else {
        VoiceFileConfig {
            enabled: Some(false),
            ..VoiceFileConfig::default()
        }
    };

    // 5. Build and write config
    let config_file = CoachConfigFile {
        data_dir: existing.data_dir,
        llm: LlmFileConfig {
            provider: Some(provider_name),
            models: Some(models),
            base_url: existing.llm.base_url,
        },
        voice,
        interview: InterviewFileConfig {
            candidate_name: Some(candidate_name),
            ..existing.interview
        },
        api_keys,
    };

    file::save_config_file(&config_path, &config_file)?;
    println!("\nConfig written to {}", config_path.display());
    println!("\nSetup complete! Run `coach new` to prepare an interview.");

    Ok(())
}

/// Ask for a key, keeping the current one on blank input
fn prompt_key(provider: &str, env_hint: &str, slot: &mut Option<String>) -> anyhow::Result<()> {
    let prompt = slot.as_deref().map_or_else(
        || format!("{provider} API key ({env_hint})"),
        |current| format!("{provider} API key (current: {}, leave blank to keep)", mask(current)),
    );

    let input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    if !input.trim().is_empty() {
        *slot = Some(input.trim().to_string());
    }
    Ok(())
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask("AIzaSyExampleKey1234"), "AIza...1234");
        assert_eq!(mask("short"), "****");
    }
}
