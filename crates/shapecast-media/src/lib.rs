//! Speech pipeline: synthesizer clients and the streaming audio relay.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use thiserror::Error;

pub mod elevenlabs;
pub mod relay;

pub use elevenlabs::ElevenLabsSynthesizer;
pub use relay::{RelayStream, SpeechRelay};

/// Encoded audio as it arrives from the synthesizer.
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes, SynthesisError>> + Send>>;

/// A single synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    /// Provider format profile, e.g. "mp3_44100_128".
    pub output_format: String,
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TTS API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("audio stream interrupted: {0}")]
    Interrupted(String),
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Provider identifier (e.g., "elevenlabs").
    fn id(&self) -> &str;

    /// Start synthesis and return the audio byte stream.
    ///
    /// Errors before the first byte are returned directly; errors after that
    /// arrive as stream items.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioStream, SynthesisError>;
}
