use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Soft limit shown next to the prompt; longer prompts are still sent.
pub const MAX_PROMPT_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    High,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Standard => "Standard (Faster)",
            Quality::High => "High Quality (Slower)",
        }
    }

    /// Progress line while the first attempt is running.
    pub fn progress_message(&self) -> &'static str {
        match self {
            Quality::Standard => "Creating your masterpiece...",
            Quality::High => "Creating your masterpiece (this may take a minute)...",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Quality::Standard),
            "high" => Ok(Quality::High),
            other => Err(GenerationError::Client(format!(
                "Unknown quality '{}', expected 'standard' or 'high'",
                other
            ))),
        }
    }
}

/// A validated prompt/quality pair. This is also the JSON body of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    prompt: String,
    quality: Quality,
}

impl GenerationRequest {
    /// Rejects prompts that are empty after trimming. The prompt itself is sent untrimmed.
    pub fn new(prompt: impl Into<String>, quality: Quality) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let request = Self { prompt, quality };
        if request.exceeds_limit() {
            log::warn!(
                "Prompt is {} characters, above the suggested {}",
                request.char_count(),
                MAX_PROMPT_CHARS
            );
        }
        Ok(request)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn char_count(&self) -> usize {
        self.prompt.chars().count()
    }

    pub fn exceeds_limit(&self) -> bool {
        self.char_count() > MAX_PROMPT_CHARS
    }

    /// Counter in the `n/500` form displayed under the prompt box.
    pub fn counter(&self) -> String {
        format!("{}/{}", self.char_count(), MAX_PROMPT_CHARS)
    }
}
