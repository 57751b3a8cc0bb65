//! Text generation over an ordered chain of candidate models
//!
//! [`ModelCaller`] tries each candidate once, in order, and returns the first
//! non-empty response. Output cleanup and parsing live in [`parser`].

mod http;
pub mod parser;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{Error, Result};

pub use http::{HttpBackend, LlmProvider};
pub use parser::Parsed;

/// A remote text-generation endpoint
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Run one generation request against `model`
    ///
    /// # Errors
    ///
    /// Returns error on any transport, quota or provider failure
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}

/// Raw output together with the candidate that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: String,
    pub model_used: String,
}

/// Priority-chain caller over a [`GenerationBackend`]
#[derive(Clone)]
pub struct ModelCaller {
    backend: Arc<dyn GenerationBackend>,
    candidates: Vec<String>,
}

impl std::fmt::Debug for ModelCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCaller")
            .field("backend", &self.backend.name())
            .field("candidates", &self.candidates)
            .finish()
    }
}

impl ModelCaller {
    /// Create a caller over `candidates`, tried in the given order
    ///
    /// # Errors
    ///
    /// Returns error if `candidates` is empty
    pub fn new(backend: Arc<dyn GenerationBackend>, candidates: Vec<String>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(Error::Config("model candidate chain is empty".to_string()));
        }
        Ok(Self {
            backend,
            candidates,
        })
    }

    /// Ordered candidate chain
    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Send `prompt` to each candidate in order until one succeeds
    ///
    /// A candidate is attempted at most once per call. An empty response
    /// counts as a failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllModelsExhausted`] if every candidate failed
    pub async fn call(&self, prompt: &str) -> Result<ModelResponse> {
        for model in &self.candidates {
            tracing::debug!(backend = self.backend.name(), model, "trying model");

            match self.backend.generate(model, prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    tracing::info!(model, chars = text.len(), "generation succeeded");
                    return Ok(ModelResponse {
                        text,
                        model_used: model.clone(),
                    });
                }
                Ok(_) => {
                    tracing::warn!(model, "model returned an empty response");
                }
                Err(e) => {
                    tracing::warn!(model, error = %e, "model failed");
                }
            }
        }

        tracing::error!(candidates = ?self.candidates, "all models failed");
        Err(Error::AllModelsExhausted {
            attempted: self.candidates.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Flaky {
        calls: Mutex<Vec<String>>,
        good: &'static str,
    }

    #[async_trait]
    impl GenerationBackend for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn generate(&self, model: &str, _prompt: &str) -> Result<String> {
            self.calls.lock().unwrap().push(model.to_string());
            if model == self.good {
                Ok("{}".to_string())
            } else if model == "blank" {
                Ok("   ".to_string())
            } else {
                Err(Error::Generation(format!("{model} is over quota")))
            }
        }
    }

    fn chain(models: &[&str]) -> Vec<String> {
        models.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_blank_response_falls_through() {
        let backend = Arc::new(Flaky {
            calls: Mutex::new(Vec::new()),
            good: "b",
        });
        let caller = ModelCaller::new(backend.clone(), chain(&["blank", "b"])).unwrap();

        let response = caller.call("prompt").await.unwrap();
        assert_eq!(response.model_used, "b");
        assert_eq!(*backend.calls.lock().unwrap(), chain(&["blank", "b"]));
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let backend = Arc::new(Flaky {
            calls: Mutex::new(Vec::new()),
            good: "a",
        });
        let caller = ModelCaller::new(backend.clone(), chain(&["a", "b"])).unwrap();

        caller.call("prompt").await.unwrap();
        assert_eq!(*backend.calls.lock().unwrap(), chain(&["a"]));
    }

    #[test]
    fn test_empty_chain_is_config_error() {
        let backend = Arc::new(Flaky {
            calls: Mutex::new(Vec::new()),
            good: "a",
        });
        let err = ModelCaller::new(backend, Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
