//! Gateway shared state.

use std::sync::Arc;

use shapecast_core::config::Config;
use shapecast_core::error::Result;
use shapecast_media::{ElevenLabsSynthesizer, SpeechRelay, SpeechSynthesizer};
use shapecast_providers::{ChatProvider, GroqProvider, ShapeGenerator, TextGenerator};

/// Clients built once at start-up and read by every handler.
pub struct AppState {
    pub config: Arc<Config>,
    pub text: TextGenerator,
    pub shapes: ShapeGenerator,
    pub speech: SpeechRelay,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        chat: Arc<dyn ChatProvider>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let model = config.llm().model().to_string();
        Self {
            text: TextGenerator::new(chat.clone(), model.clone()),
            shapes: ShapeGenerator::new(chat, model),
            speech: SpeechRelay::new(synthesizer, &config.tts()),
            config,
        }
    }

    /// Build the real Groq and ElevenLabs clients from config.
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let chat = Arc::new(GroqProvider::from_config(&config.llm())?);
        let synthesizer = Arc::new(ElevenLabsSynthesizer::from_config(&config.tts())?);
        Ok(Self::new(config, chat, synthesizer))
    }
}
