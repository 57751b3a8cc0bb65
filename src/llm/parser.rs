//! Cleanup and parsing of raw model output
//!
//! Models often wrap JSON in markdown fences or add a sentence of prose around
//! it. [`parse`] strips the fences, trims, and parses; if that fails it makes
//! one more attempt on the outermost JSON span.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*\s*").expect("valid regex"));

static TRAILING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```\s*$").expect("valid regex"));

/// Outcome of a parse with a caller-supplied fallback
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// The model output parsed
    Structured(T),
    /// The model output did not parse; this is the fallback value
    Fallback(T),
}

impl<T> Parsed<T> {
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Structured(value) | Self::Fallback(value) => value,
        }
    }
}

/// Strip a leading fence (with optional language tag) and a trailing fence, then trim
#[must_use]
pub fn clean(raw: &str) -> String {
    let text = raw.trim();
    let text = LEADING_FENCE.replace(text, "");
    let text = TRAILING_FENCE.replace(&text, "");
    text.trim().to_string()
}

/// Parse raw model output into `T`
///
/// # Errors
///
/// Returns [`Error::Parse`] if neither the cleaned text nor its outermost JSON
/// span deserializes into `T`
pub fn parse<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let cleaned = clean(raw);

    let first_error = match serde_json::from_str(&cleaned) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(span) = json_span(&cleaned)
        && span.len() < cleaned.len()
        && let Ok(value) = serde_json::from_str(span)
    {
        tracing::debug!("parsed model output after trimming surrounding prose");
        return Ok(value);
    }

    Err(Error::Parse(format!(
        "{first_error} (output starts with {:?})",
        preview(&cleaned)
    )))
}

/// Parse raw model output, substituting `fallback` on failure
pub fn parse_or<T: DeserializeOwned>(raw: &str, fallback: impl FnOnce() -> T) -> Parsed<T> {
    match parse(raw) {
        Ok(value) => Parsed::Structured(value),
        Err(e) => {
            tracing::warn!(error = %e, "model output unparseable, using fallback");
            Parsed::Fallback(fallback())
        }
    }
}

/// From the first `{` or `[` to the last matching closer
fn json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}
