//! Language-model plumbing.
//!
//! [`ChatProvider`] is the seam to the outside world: one request in, one
//! completion out. [`TextGenerator`] and [`ShapeGenerator`] wrap a provider
//! with their fixed instructions and sampling settings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod groq;
pub mod shape;
pub mod text;

pub use groq::GroqProvider;
pub use shape::ShapeGenerator;
pub use text::TextGenerator;

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// A non-streaming completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Ask the provider to constrain output to a JSON object.
    pub json_mode: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// Content of the first choice returned by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("could not decode provider response: {0}")]
    Decode(String),
}

/// The core language-model provider trait.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider identifier (e.g., "groq").
    fn id(&self) -> &str;

    /// Run one completion and return the first choice.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}

#[cfg(test)]
pub(crate) mod testing;
