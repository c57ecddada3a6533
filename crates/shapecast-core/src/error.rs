use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShapecastError {
    /// Required input missing or empty. The caller's fault.
    #[error("{0}")]
    Validation(String),

    /// Upstream returned content that is not JSON or breaks the shape contract.
    #[error("{message}")]
    Format { message: String, raw: String },

    #[error("Unsupported shape kind: {0}")]
    UnsupportedShape(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShapecastError {
    pub fn format(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// True for both flavours of malformed upstream content.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::UnsupportedShape(_))
    }

    /// Raw upstream text attached to a format failure, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Format { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShapecastError>;
