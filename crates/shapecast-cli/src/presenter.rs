//! Terminal scene presenter.
//!
//! Stands in for the browser page when working from a shell: each concept
//! becomes a shape, the shape is checked the way the renderer would check
//! it, and the live mesh is swapped in the single slot.

use std::path::PathBuf;

use tracing::{debug, warn};

use shapecast_core::error::ShapecastError;
use shapecast_core::shape::{Geometry, RenderError, ShapeDescriptor};
use shapecast_core::slot::{Dispose, ShapeSlot};
use shapecast_media::SpeechRelay;
use shapecast_media::relay::collect_to_file;
use shapecast_providers::{ShapeGenerator, TextGenerator};

/// A shape that passed the renderer's constructor check.
#[derive(Debug)]
pub struct TerminalMesh {
    pub geometry: Geometry,
    pub concept: String,
    released: bool,
}

impl TerminalMesh {
    pub fn build(shape: &ShapeDescriptor, concept: &str) -> Result<Self, RenderError> {
        Ok(Self {
            geometry: shape.geometry()?,
            concept: concept.to_string(),
            released: false,
        })
    }

    pub fn describe(&self) -> String {
        let params = self
            .geometry
            .parameters
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}({params}) #{:06x}",
            self.geometry.kind, self.geometry.rgb
        )
    }
}

impl Dispose for TerminalMesh {
    fn dispose(&mut self) {
        if !self.released {
            self.released = true;
            debug!(concept = %self.concept, "Released mesh");
        }
    }
}

/// What happened to one concept.
#[derive(Debug)]
pub enum Outcome {
    Shown(String),
    FormatFailed(String),
    RenderFailed(String),
}

pub struct Presenter {
    shapes: ShapeGenerator,
    text: TextGenerator,
    speech: SpeechRelay,
    narrate_dir: Option<PathBuf>,
    narrations: u64,
    slot: ShapeSlot<TerminalMesh>,
}

impl Presenter {
    pub fn new(
        shapes: ShapeGenerator,
        text: TextGenerator,
        speech: SpeechRelay,
        narrate_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            shapes,
            text,
            speech,
            narrate_dir,
            narrations: 0,
            slot: ShapeSlot::new(),
        }
    }

    pub fn current(&self) -> Option<&TerminalMesh> {
        self.slot.current()
    }

    /// Generate and show a shape for `concept`.
    ///
    /// Format and render failures leave the previous shape in place.
    pub async fn show(&mut self, concept: &str) -> Result<Outcome, ShapecastError> {
        let shape = match self.shapes.generate(concept).await {
            Ok(shape) => shape,
            Err(e) if e.is_format_error() => return Ok(Outcome::FormatFailed(e.to_string())),
            Err(e) => return Err(e),
        };

        match TerminalMesh::build(&shape, concept) {
            Ok(mesh) => Ok(Outcome::Shown(self.slot.replace(mesh).describe())),
            Err(e) => {
                warn!(error = %e, "Shape failed the renderer check");
                Ok(Outcome::RenderFailed(e.to_string()))
            }
        }
    }

    /// Narrate `concept` into the narration directory, if one is set.
    ///
    /// Returns the narration text and the written file.
    pub async fn narrate(&mut self, concept: &str) -> anyhow::Result<Option<(String, PathBuf)>> {
        let Some(path) = self.next_narration_path() else {
            return Ok(None);
        };
        let text = self.text.generate(concept).await?;
        let stream = self.speech.stream(&text).await?;
        collect_to_file(stream, &path).await?;
        Ok(Some((text, path)))
    }

    /// One file per narrated concept, whether or not its shape rendered.
    fn next_narration_path(&mut self) -> Option<PathBuf> {
        let dir = self.narrate_dir.as_ref()?;
        self.narrations += 1;
        Some(dir.join(format!("narration_{:03}.mp3", self.narrations)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use shapecast_core::shape::ShapeKind;
    use shapecast_media::ElevenLabsSynthesizer;
    use shapecast_providers::{ChatProvider, ChatRequest, ChatResponse, ProviderError};

    use super::*;

    /// Replies with the queued documents in order.
    struct QueuedChat {
        replies: Mutex<VecDeque<&'static str>>,
    }

    #[async_trait]
    impl ChatProvider for QueuedChat {
        fn id(&self) -> &str {
            "queued"
        }

        async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            let content = self.replies.lock().unwrap().pop_front().map(str::to_string);
            Ok(ChatResponse {
                content,
                ..ChatResponse::default()
            })
        }
    }

    fn presenter(replies: &[&'static str], narrate_dir: Option<PathBuf>) -> Presenter {
        let chat = Arc::new(QueuedChat {
            replies: Mutex::new(replies.iter().copied().collect()),
        });
        // Never contacted: nothing here synthesizes speech
        let speech = SpeechRelay::new(
            Arc::new(ElevenLabsSynthesizer::new("unused", "http://127.0.0.1:9")),
            &Default::default(),
        );
        Presenter::new(
            ShapeGenerator::new(chat.clone(), "test-model"),
            TextGenerator::new(chat, "test-model"),
            speech,
            narrate_dir,
        )
    }

    fn shape(kind: ShapeKind, parameters: Vec<f64>) -> ShapeDescriptor {
        ShapeDescriptor {
            kind,
            parameters,
            color: "#ff8800".into(),
        }
    }

    #[test]
    fn test_describe() {
        let mesh = TerminalMesh::build(&shape(ShapeKind::Box, vec![1.0, 2.5, 3.0]), "crate").unwrap();
        assert_eq!(mesh.describe(), "Box(1, 2.5, 3) #ff8800");
    }

    #[test]
    fn test_build_surfaces_render_error() {
        let err = TerminalMesh::build(&shape(ShapeKind::Cylinder, vec![1.0]), "pipe").unwrap_err();
        assert!(err.to_string().contains("Cylinder takes 3 to 8 parameters"));
    }

    #[test]
    fn test_slot_swaps_meshes() {
        let mut slot = ShapeSlot::new();
        slot.replace(TerminalMesh::build(&shape(ShapeKind::Sphere, vec![1.0]), "a").unwrap());
        slot.replace(TerminalMesh::build(&shape(ShapeKind::Box, vec![1.0, 1.0, 1.0]), "b").unwrap());
        assert_eq!(slot.current().map(|m| m.concept.as_str()), Some("b"));
        assert_eq!(slot.generation(), 2);
    }

    #[tokio::test]
    async fn test_failures_keep_previous_shape() {
        let mut presenter = presenter(
            &[
                r##"{"kind":"Box","parameters":[1,1,1],"color":"#ff0000"}"##,
                "not json",
                r##"{"kind":"Cylinder","parameters":[1],"color":"#00ff00"}"##,
            ],
            None,
        );

        let outcome = presenter.show("a red cube").await.unwrap();
        assert!(matches!(outcome, Outcome::Shown(_)));

        let outcome = presenter.show("gibberish").await.unwrap();
        assert!(matches!(outcome, Outcome::FormatFailed(_)));
        assert_eq!(presenter.current().map(|m| m.concept.as_str()), Some("a red cube"));

        let outcome = presenter.show("a thin pipe").await.unwrap();
        assert!(matches!(outcome, Outcome::RenderFailed(_)));
        assert_eq!(presenter.current().map(|m| m.concept.as_str()), Some("a red cube"));
        assert_eq!(presenter.slot.generation(), 1);
    }

    #[tokio::test]
    async fn test_narration_files_advance_per_concept() {
        let mut presenter = presenter(&["not json"], Some(PathBuf::from("out")));
        let first = presenter.next_narration_path().unwrap();

        let outcome = presenter.show("gibberish").await.unwrap();
        assert!(matches!(outcome, Outcome::FormatFailed(_)));

        let second = presenter.next_narration_path().unwrap();
        assert_eq!(first, PathBuf::from("out/narration_001.mp3"));
        assert_eq!(second, PathBuf::from("out/narration_002.mp3"));
    }

    #[test]
    fn test_no_narration_path_without_directory() {
        let mut presenter = presenter(&[], None);
        assert!(presenter.next_narration_path().is_none());
    }
}
