//! Streaming speech relay.
//!
//! Forwards synthesizer output chunk by chunk. Nothing is buffered beyond
//! the chunk in flight, so memory use does not depend on clip length.
//! Dropping a [`RelayStream`] drops the upstream response with it, which is
//! how a client disconnect releases the upstream connection.

use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use shapecast_core::config::TtsConfig;
use shapecast_core::error::{Result, ShapecastError};

use crate::{AudioStream, SpeechRequest, SpeechSynthesizer, SynthesisError};

pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";
pub const AUDIO_CONTENT_DISPOSITION: &str = "inline; filename=\"generated_audio.mp3\"";

/// Synthesizer plus the fixed voice profile used for every request.
#[derive(Clone)]
pub struct SpeechRelay {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voice_id: String,
    model_id: String,
    output_format: String,
}

impl SpeechRelay {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, config: &TtsConfig) -> Self {
        Self {
            synthesizer,
            voice_id: config.voice_id().to_string(),
            model_id: config.model_id().to_string(),
            output_format: config.output_format().to_string(),
        }
    }

    pub fn request_for(&self, text: &str) -> SpeechRequest {
        SpeechRequest {
            text: text.to_string(),
            voice_id: self.voice_id.clone(),
            model_id: self.model_id.clone(),
            output_format: self.output_format.clone(),
        }
    }

    /// Start synthesis of `text` and return the relayed audio stream.
    pub async fn stream(&self, text: &str) -> Result<RelayStream<AudioStream>> {
        if text.trim().is_empty() {
            return Err(ShapecastError::Validation("The text field is required.".into()));
        }

        info!(
            provider = self.synthesizer.id(),
            voice = %self.voice_id,
            text_len = text.len(),
            "Synthesizing speech"
        );

        let upstream = self
            .synthesizer
            .synthesize(&self.request_for(text))
            .await
            .map_err(|e| ShapecastError::Synthesis(e.to_string()))?;

        Ok(RelayStream::new(upstream))
    }
}

pin_project! {
    /// Pass-through stream that counts what it forwards.
    ///
    /// Ends after the first upstream error: a truncated clip is not
    /// resumable, so the consumer must treat it as fatal.
    pub struct RelayStream<S> {
        #[pin]
        inner: S,
        stats: RelayStats,
    }
}

impl<S> RelayStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            stats: RelayStats::default(),
        }
    }

    pub fn bytes_relayed(&self) -> u64 {
        self.stats.bytes
    }

    pub fn chunks_relayed(&self) -> u64 {
        self.stats.chunks
    }
}

impl<S> Stream for RelayStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, SynthesisError>>,
{
    type Item = std::result::Result<Bytes, SynthesisError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if this.stats.outcome != Outcome::Streaming {
            return Poll::Ready(None);
        }

        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => {
                this.stats.chunks += 1;
                this.stats.bytes += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                this.stats.outcome = Outcome::Failed;
                warn!(error = %e, bytes = this.stats.bytes, "Upstream audio stream failed");
                Poll::Ready(Some(Err(e)))
            }
            None => {
                this.stats.outcome = Outcome::Finished;
                Poll::Ready(None)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Outcome {
    #[default]
    Streaming,
    Finished,
    Failed,
}

#[derive(Debug, Default)]
struct RelayStats {
    bytes: u64,
    chunks: u64,
    outcome: Outcome,
}

impl Drop for RelayStats {
    fn drop(&mut self) {
        match self.outcome {
            Outcome::Finished => {
                info!(bytes = self.bytes, chunks = self.chunks, "Audio relayed");
            }
            Outcome::Failed => {
                warn!(bytes = self.bytes, chunks = self.chunks, "Audio relay aborted by upstream");
            }
            Outcome::Streaming => {
                info!(bytes = self.bytes, chunks = self.chunks, "Audio relay cancelled by client");
            }
        }
    }
}

/// Write a relayed stream to `path` chunk by chunk.
///
/// On any failure, upstream or local, the partial file is removed.
pub async fn collect_to_file<S>(stream: S, path: &Path) -> anyhow::Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, SynthesisError>> + Unpin,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(path).await?;
    let result = write_stream(stream, &mut file).await;
    drop(file);

    match result {
        Ok(written) => {
            debug!(path = %path.display(), bytes = written, "Audio written");
            Ok(written)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(path).await;
            Err(e)
        }
    }
}

async fn write_stream<S, W>(mut stream: S, sink: &mut W) -> anyhow::Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, SynthesisError>> + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| anyhow::anyhow!("TTS stream error: {e}"))?;
        sink.write_all(&bytes).await?;
        written += bytes.len() as u64;
    }
    sink.flush().await?;
    Ok(written)
}
