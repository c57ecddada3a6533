//! Groq chat completions provider.
//!
//! Groq speaks the OpenAI `/v1/chat/completions` protocol, so this client
//! works against any OpenAI-compatible endpoint given a different base URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shapecast_core::config::LlmConfig;
use shapecast_core::error::ShapecastError;

use crate::{ChatMessage, ChatProvider, ChatRequest, ChatResponse, ProviderError, Usage};

pub struct GroqProvider {
    pub base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from config; a missing API key is a config error.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ShapecastError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ShapecastError::Config(
                "No language-model API key. Set llm.api_key or GROQ_API_KEY.".into(),
            )
        })?;
        Ok(Self::new(api_key, config.base_url()))
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

// --- OpenAI-compatible request/response types ---

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl<'a> From<&'a ChatRequest> for CompletionBody<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            stream: false,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl From<ChatCompletion> for ChatResponse {
    fn from(completion: ChatCompletion) -> Self {
        let first = completion.choices.into_iter().next();
        let finish_reason = first.as_ref().and_then(|c| c.finish_reason.clone());
        Self {
            content: first.and_then(|c| c.message).and_then(|m| m.content),
            finish_reason,
            usage: completion.usage.map(|u| Usage {
                input_tokens: Some(u.prompt_tokens),
                output_tokens: Some(u.completion_tokens),
            }),
        }
    }
}

#[async_trait]
impl ChatProvider for GroqProvider {
    fn id(&self) -> &str {
        "groq"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = CompletionBody::from(request);

        debug!(
            model = %body.model,
            base_url = %self.base_url,
            json_mode = request.json_mode,
            "Calling chat completions API"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(completion.into())
    }
}
