//! Narration text generation.

use std::sync::Arc;

use tracing::{info, warn};

use shapecast_core::error::{Result, ShapecastError};

use crate::{ChatMessage, ChatProvider, ChatRequest};

const SYSTEM_INSTRUCTION: &str = "You are a concise professional writer. Write one short \
paragraph (50 words maximum) about the given subject. It will be read aloud, so use plain \
sentences without lists, markup, or headings.";

pub const TEMPERATURE: f64 = 0.7;
pub const MAX_TOKENS: u32 = 150;

/// Returned when the model produces no usable content.
pub const FALLBACK_TEXT: &str = "Sorry, no text could be generated for this prompt.";

/// Generates short spoken-narration paragraphs.
#[derive(Clone)]
pub struct TextGenerator {
    provider: Arc<dyn ChatProvider>,
    model: String,
}

impl TextGenerator {
    pub fn new(provider: Arc<dyn ChatProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn request_for(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_INSTRUCTION),
                ChatMessage::user(prompt),
            ],
            temperature: Some(TEMPERATURE),
            max_tokens: Some(MAX_TOKENS),
            json_mode: false,
        }
    }

    /// Generate a paragraph for `prompt`.
    ///
    /// An empty completion is not an error: [`FALLBACK_TEXT`] is returned
    /// instead. Transport and API failures surface as `Generation` errors.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(ShapecastError::Validation(
                "A prompt is required for text generation.".into(),
            ));
        }

        info!(provider = self.provider.id(), prompt_len = prompt.len(), "Generating text");

        let response = self
            .provider
            .complete(&self.request_for(prompt))
            .await
            .map_err(|e| ShapecastError::Generation(e.to_string()))?;

        match response.content.filter(|c| !c.trim().is_empty()) {
            Some(text) => Ok(text),
            None => {
                warn!(finish_reason = ?response.finish_reason, "Model returned no text, using fallback");
                Ok(FALLBACK_TEXT.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    #[tokio::test]
    async fn test_generate_returns_content() {
        let provider = ScriptedProvider::new(Ok(Some("A calm red cube.")));
        let generator = TextGenerator::new(provider.clone(), "m");
        let text = generator.generate("a red cube").await.unwrap();
        assert_eq!(text, "A calm red cube.");

        let seen = provider.seen.lock().unwrap();
        let req = &seen[0];
        assert_eq!(req.temperature, Some(0.7));
        assert_eq!(req.max_tokens, Some(150));
        assert!(!req.json_mode);
        assert_eq!(req.messages[0].role, "system");
        assert!(req.messages[0].content.contains("50 words"));
        assert_eq!(req.messages[1].content, "a red cube");
    }

    #[tokio::test]
    async fn test_missing_content_falls_back() {
        let generator = TextGenerator::new(ScriptedProvider::new(Ok(None)), "m");
        assert_eq!(generator.generate("x").await.unwrap(), FALLBACK_TEXT);

        let generator = TextGenerator::new(ScriptedProvider::new(Ok(Some("   "))), "m");
        assert_eq!(generator.generate("x").await.unwrap(), FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_generation_error() {
        let generator = TextGenerator::new(ScriptedProvider::new(Err(503)), "m");
        let err = generator.generate("x").await.unwrap_err();
        assert!(matches!(err, ShapecastError::Generation(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn test_empty_prompt_never_calls_provider() {
        let provider = ScriptedProvider::new(Ok(Some("unused")));
        let generator = TextGenerator::new(provider.clone(), "m");
        let err = generator.generate("  ").await.unwrap_err();
        assert!(matches!(err, ShapecastError::Validation(_)));
        assert!(provider.seen.lock().unwrap().is_empty());
    }
}
