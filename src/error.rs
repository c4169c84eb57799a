//! Error types for snapcode

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Export error types
///
/// Every variant fails the whole request. Soft failures (fonts, clipboard)
/// have their own types and never end up here.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported request type: {0:?}")]
    UnsupportedRequestType(String),

    #[error("Renderer timed out after {}s", .0.as_secs())]
    RenderTimeout(Duration),

    #[error("Renderer failed: {message}")]
    Renderer {
        message: String,
        stderr: Option<String>,
    },

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reported by the exporter process, passed through as-is
    #[error("{0}")]
    Remote(String),
}

impl ExportError {
    /// Renderer failure without captured stderr
    pub fn renderer(message: impl Into<String>) -> Self {
        ExportError::Renderer {
            message: message.into(),
            stderr: None,
        }
    }

    /// Structured details for the failure response
    pub fn context(&self) -> Option<Value> {
        match self {
            ExportError::Json(e) => Some(json!({
                "line": e.line(),
                "column": e.column(),
            })),
            ExportError::Renderer {
                stderr: Some(stderr),
                ..
            } => Some(json!({ "stderr": stderr })),
            ExportError::RenderTimeout(timeout) => Some(json!({ "timeout_secs": timeout.as_secs() })),
            _ => None,
        }
    }
}
