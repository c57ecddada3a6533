//! Test doubles shared by the generator tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{ChatProvider, ChatRequest, ChatResponse, ProviderError};

/// Replays a fixed outcome and records requests.
pub(crate) struct ScriptedProvider {
    reply: Result<Option<String>, u16>,
    pub seen: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    /// `Ok(content)` answers with that content, `Err(status)` fails with an API error.
    pub fn new(reply: Result<Option<&str>, u16>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.map(|c| c.map(str::to_string)),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.seen.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(content) => Ok(ChatResponse {
                content: content.clone(),
                ..ChatResponse::default()
            }),
            Err(status) => Err(ProviderError::Api {
                status: *status,
                body: "upstream exploded".into(),
            }),
        }
    }
}
