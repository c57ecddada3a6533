//! Mapping from internal failures to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use shapecast_core::error::ShapecastError;

/// Which operation failed; decides the message prefix and shape-specific handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Text,
    Shape,
    Speech,
}

impl Operation {
    fn label(&self) -> &'static str {
        match self {
            Self::Text => "Text generation failed",
            Self::Shape => "3D generation failed",
            Self::Speech => "Speech synthesis failed",
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub operation: Operation,
    pub source: ShapecastError,
}

impl ApiError {
    pub fn new(operation: Operation, source: ShapecastError) -> Self {
        Self { operation, source }
    }

    pub fn status(&self) -> StatusCode {
        match (&self.source, self.operation) {
            (ShapecastError::Validation(_), _) => StatusCode::BAD_REQUEST,
            // The page reads `{error}` from a successful response
            (e, Operation::Shape) if e.is_format_error() => StatusCode::OK,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match (status, &self.source) {
            (StatusCode::BAD_REQUEST, e) => {
                warn!(operation = ?self.operation, reason = %e, "Rejected request");
                (status, e.to_string()).into_response()
            }
            (StatusCode::OK, e) => {
                warn!(operation = ?self.operation, error = %e, "Returning formatting error payload");
                (status, Json(json!({ "error": e.to_string() }))).into_response()
            }
            (_, e) => {
                error!(operation = ?self.operation, error = %e, "Operation failed");
                (status, format!("{}: {e}", self.operation.label())).into_response()
            }
        }
    }
}
