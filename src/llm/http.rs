//! HTTP generation backends (Gemini and OpenAI-compatible)

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::GenerationBackend;
use crate::{Error, Result};

/// Default Gemini API endpoint
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default `OpenAI` API endpoint
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Which API shape the backend speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Google Gemini `generateContent`
    Gemini,
    /// Any `OpenAI`-compatible `chat/completions` endpoint
    OpenAi,
}

impl LlmProvider {
    /// Parse a provider name from configuration
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "openai" | "openai-compatible" => Some(Self::OpenAi),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }

    const fn default_base_url(self) -> &'static str {
        match self {
            Self::Gemini => GEMINI_BASE_URL,
            Self::OpenAi => OPENAI_BASE_URL,
        }
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Generation backend over HTTPS
pub struct HttpBackend {
    client: reqwest::Client,
    provider: LlmProvider,
    api_key: SecretString,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend for `provider`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(
        provider: LlmProvider,
        api_key: Option<SecretString>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.expose_secret().is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{} API key required", provider.as_str()))
            })?;

        let base_url = base_url
            .unwrap_or_else(|| provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: reqwest::Client::new(),
            provider,
            api_key,
            base_url,
        })
    }

    async fn generate_gemini(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("Gemini error {status}: {body}")));
        }

        let result: GeminiResponse = response.json().await?;
        let text = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(text)
    }

    async fn generate_openai(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("chat completion error {status}: {body}")));
        }

        let result: ChatResponse = response.json().await?;
        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    fn name(&self) -> &str {
        self.provider.as_str()
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        match self.provider {
            LlmProvider::Gemini => self.generate_gemini(model, prompt).await,
            LlmProvider::OpenAi => self.generate_openai(model, prompt).await,
        }
    }
}
