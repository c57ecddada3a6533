//! Operation handlers.
//!
//! Every handler checks its required field first, so an empty or missing
//! field never reaches an upstream client.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use shapecast_core::error::ShapecastError;
use shapecast_core::shape::ShapeDescriptor;
use shapecast_media::relay::{AUDIO_CONTENT_DISPOSITION, AUDIO_CONTENT_TYPE};

use crate::error::{ApiError, Operation};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PromptBody {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpeechBody {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

/// Unwrap a JSON body and its required field, or fail with a 400.
fn require<T>(
    operation: Operation,
    body: Result<Json<T>, JsonRejection>,
    field: impl FnOnce(T) -> Option<String>,
    reason: &str,
) -> Result<String, ApiError> {
    let invalid = || ApiError::new(operation, ShapecastError::Validation(reason.to_string()));
    let Json(body) = body.map_err(|_| invalid())?;
    field(body)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(invalid)
}

pub async fn generate_text(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PromptBody>, JsonRejection>,
) -> Result<Json<TextResponse>, ApiError> {
    let prompt = require(
        Operation::Text,
        body,
        |b| b.prompt,
        "A prompt is required for text generation.",
    )?;

    let text = state
        .text
        .generate(&prompt)
        .await
        .map_err(|e| ApiError::new(Operation::Text, e))?;

    Ok(Json(TextResponse { text }))
}

pub async fn generate_shape(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PromptBody>, JsonRejection>,
) -> Result<Json<ShapeDescriptor>, ApiError> {
    let prompt = require(
        Operation::Shape,
        body,
        |b| b.prompt,
        "A prompt is required for 3D generation.",
    )?;

    let shape = state
        .shapes
        .generate(&prompt)
        .await
        .map_err(|e| ApiError::new(Operation::Shape, e))?;

    Ok(Json(shape))
}

pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SpeechBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let text = require(
        Operation::Speech,
        body,
        |b| b.text,
        "The text field is required.",
    )?;

    let stream = state
        .speech
        .stream(&text)
        .await
        .map_err(|e| ApiError::new(Operation::Speech, e))?;

    Ok((
        [
            (header::CONTENT_TYPE, AUDIO_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, AUDIO_CONTENT_DISPOSITION),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
