//! Shape descriptor generation.
//!
//! The model is asked for a single JSON object in JSON output mode, then the
//! raw text goes through the same validator the rest of the system uses.
//! Nothing is coerced: unparsable output fails with the raw text attached.

use std::sync::Arc;

use tracing::{error, info};

use shapecast_core::error::{Result, ShapecastError};
use shapecast_core::shape::{ShapeDescriptor, parse_shape_document};

use crate::{ChatMessage, ChatProvider, ChatRequest};

pub const SYSTEM_INSTRUCTION: &str = "You are an expert in simple 3D modelling for a WebGL \
renderer. Reply with a single JSON object and nothing else, with exactly this structure: \
{ \"kind\": string, \"parameters\": [number, ...], \"color\": \"#RRGGBB\" }. \
\"kind\" must be one of \"Box\", \"Sphere\" or \"Cylinder\". \
For Box, parameters are [width, height, depth]. \
For Sphere, parameters are [radius, widthSegments, heightSegments]. \
For Cylinder, parameters are [radiusTop, radiusBottom, height, radialSegments]. \
\"color\" is a hexadecimal colour string. Base the shape, its size and its colour on the \
user's concept.";

/// Higher than narration: variety matters more than consistency here.
pub const TEMPERATURE: f64 = 0.8;

/// Generates validated [`ShapeDescriptor`]s from free-text concepts.
#[derive(Clone)]
pub struct ShapeGenerator {
    provider: Arc<dyn ChatProvider>,
    model: String,
}

impl ShapeGenerator {
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
                ChatMessage::user(format!(
                    "Generate a relevant 3D shape for the following concept: \"{prompt}\""
                )),
            ],
            temperature: Some(TEMPERATURE),
            max_tokens: None,
            json_mode: true,
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<ShapeDescriptor> {
        if prompt.trim().is_empty() {
            return Err(ShapecastError::Validation(
                "A prompt is required for 3D generation.".into(),
            ));
        }

        info!(provider = self.provider.id(), prompt_len = prompt.len(), "Generating shape");

        let response = self
            .provider
            .complete(&self.request_for(prompt))
            .await
            .map_err(|e| ShapecastError::Generation(e.to_string()))?;

        let raw = response.content.unwrap_or_default();
        let shape = parse_shape_document(&raw).inspect_err(|e| {
            error!(raw = %raw, error = %e, "Model returned an invalid shape document");
        })?;

        info!(kind = %shape.kind, params = shape.parameters.len(), color = %shape.color, "Shape generated");
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use shapecast_core::shape::ShapeKind;

    use super::*;
    use crate::testing::ScriptedProvider;

    #[tokio::test]
    async fn test_red_cube() {
        let provider = ScriptedProvider::new(Ok(Some(
            r##"{"kind":"Box","parameters":[1,1,1],"color":"#ff0000"}"##,
        )));
        let generator = ShapeGenerator::new(provider.clone(), "m");
        let shape = generator.generate("a red cube").await.unwrap();
        assert_eq!(shape.kind, ShapeKind::Box);
        assert_eq!(shape.parameters, vec![1.0, 1.0, 1.0]);
        assert_eq!(shape.color, "#ff0000");

        let seen = provider.seen.lock().unwrap();
        let req = &seen[0];
        assert!(req.json_mode);
        assert_eq!(req.temperature, Some(0.8));
        let system = &req.messages[0].content;
        for kind in ["Box", "Sphere", "Cylinder", "\"kind\"", "\"parameters\"", "\"color\""] {
            assert!(system.contains(kind), "system instruction lacks {kind}");
        }
        assert!(req.messages[1].content.contains("a red cube"));
    }

    #[tokio::test]
    async fn test_not_json_is_format_error_with_raw() {
        let generator = ShapeGenerator::new(ScriptedProvider::new(Ok(Some("not json"))), "m");
        let err = generator.generate("anything").await.unwrap_err();
        assert!(err.is_format_error());
        assert_eq!(err.raw(), Some("not json"));
    }

    #[tokio::test]
    async fn test_missing_content_is_format_error() {
        let generator = ShapeGenerator::new(ScriptedProvider::new(Ok(None)), "m");
        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, ShapecastError::Format { .. }));
    }

    #[tokio::test]
    async fn test_unsupported_kind() {
        let generator = ShapeGenerator::new(
            ScriptedProvider::new(Ok(Some(
                r##"{"kind":"Torus","parameters":[1,0.4],"color":"#00ff00"}"##,
            ))),
            "m",
        );
        let err = generator.generate("a donut").await.unwrap_err();
        assert!(matches!(err, ShapecastError::UnsupportedShape(ref k) if k == "Torus"));
        assert!(err.is_format_error());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_generation_error() {
        let generator = ShapeGenerator::new(ScriptedProvider::new(Err(500)), "m");
        let err = generator.generate("x").await.unwrap_err();
        assert!(matches!(err, ShapecastError::Generation(_)));
    }

    #[tokio::test]
    async fn test_empty_prompt_never_calls_provider() {
        let provider = ScriptedProvider::new(Ok(Some("{}")));
        let generator = ShapeGenerator::new(provider.clone(), "m");
        assert!(matches!(
            generator.generate("").await,
            Err(ShapecastError::Validation(_))
        ));
        assert!(provider.seen.lock().unwrap().is_empty());
    }
}
