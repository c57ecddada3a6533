//! ElevenLabs streaming text-to-speech.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;
use tracing::debug;

use shapecast_core::config::TtsConfig;
use shapecast_core::error::ShapecastError;

use crate::{AudioStream, SpeechRequest, SpeechSynthesizer, SynthesisError};

pub struct ElevenLabsSynthesizer {
    pub base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabsSynthesizer {
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from config; a missing API key is a config error.
    pub fn from_config(config: &TtsConfig) -> Result<Self, ShapecastError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ShapecastError::Config(
                "No speech API key. Set tts.api_key or ELEVEN_LABS_API_KEY.".into(),
            )
        })?;
        Ok(Self::new(api_key, config.base_url()))
    }

    /// Streaming endpoint for a given voice and output format.
    pub fn stream_url(&self, voice: &str, output_format: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{voice}/stream?output_format={output_format}",
            self.base_url
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn id(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioStream, SynthesisError> {
        let url = self.stream_url(&request.voice_id, &request.output_format);

        debug!(
            voice = %request.voice_id,
            model = %request.model_id,
            text_len = request.text.len(),
            "Starting TTS stream"
        );

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&SpeechBody {
                text: &request.text,
                model_id: &request.model_id,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SynthesisError::Api { status, body });
        }

        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| SynthesisError::Interrupted(e.to_string())));

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        body::Body,
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use bytes::Bytes;
    use serde_json::Value;

    use super::*;

    #[derive(Default)]
    struct Seen {
        voice: Option<String>,
        format: Option<String>,
        key: Option<String>,
        body: Option<Value>,
    }

    type Shared = Arc<Mutex<Seen>>;

    async fn speech(
        State(seen): State<Shared>,
        Path(voice): Path<String>,
        Query(query): Query<std::collections::HashMap<String, String>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        let fail = body["text"] == "fail";
        {
            let mut seen = seen.lock().unwrap();
            seen.voice = Some(voice);
            seen.format = query.get("output_format").cloned();
            seen.key = headers
                .get("xi-api-key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            seen.body = Some(body);
        }
        if fail {
            return (StatusCode::UNPROCESSABLE_ENTITY, "quota exceeded").into_response();
        }
        let chunks: Vec<Result<Bytes, std::io::Error>> = (0..5u8)
            .map(|i| Ok(Bytes::from(vec![i; 1000])))
            .collect();
        Body::from_stream(futures::stream::iter(chunks)).into_response()
    }

    async fn fake_api() -> (String, Shared) {
        let seen = Shared::default();
        let app = Router::new()
            .route("/v1/text-to-speech/{voice}/stream", post(speech))
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), seen)
    }

    fn request(text: &str) -> SpeechRequest {
        SpeechRequest {
            text: text.into(),
            voice_id: "JBFqnCBsd6RMkjVDRZzb".into(),
            model_id: "eleven_multilingual_v2".into(),
            output_format: "mp3_44100_128".into(),
        }
    }

    #[test]
    fn test_stream_url() {
        let tts = ElevenLabsSynthesizer::new("k", "https://api.elevenlabs.io/");
        let url = tts.stream_url("Rachel", "mp3_44100_128");
        assert_eq!(
            url,
            "https://api.elevenlabs.io/v1/text-to-speech/Rachel/stream?output_format=mp3_44100_128"
        );
    }

    #[tokio::test]
    async fn test_synthesize_streams_bytes() {
        let (base, seen) = fake_api().await;
        let tts = ElevenLabsSynthesizer::new("xi-test", &base);
        let mut stream = tts.synthesize(&request("hello")).await.unwrap();

        let mut audio = Vec::new();
        while let Some(chunk) = stream.next().await {
            audio.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(audio.len(), 5000);
        assert_eq!(audio[0], 0);
        assert_eq!(audio[4999], 4);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.voice.as_deref(), Some("JBFqnCBsd6RMkjVDRZzb"));
        assert_eq!(seen.format.as_deref(), Some("mp3_44100_128"));
        assert_eq!(seen.key.as_deref(), Some("xi-test"));
        let body = seen.body.as_ref().unwrap();
        assert_eq!(body["text"], "hello");
        assert_eq!(body["model_id"], "eleven_multilingual_v2");
    }

    #[tokio::test]
    async fn test_synthesize_api_error() {
        let (base, _seen) = fake_api().await;
        let tts = ElevenLabsSynthesizer::new("xi-test", &base);
        let err = match tts.synthesize(&request("fail")).await {
            Ok(_) => panic!("expected an API error"),
            Err(e) => e,
        };
        match err {
            SynthesisError::Api { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("quota"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
