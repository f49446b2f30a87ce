//! Structured error types for the layout engine.
//!
//! Missing content never errors (the record builders substitute
//! placeholders) and logo failures are downgraded inside the header renderer.
//! What is left is bad input, misuse of the canvas, and failed writes.

use std::path::PathBuf;

use thiserror::Error;

use crate::canvas::CanvasError;
use crate::image_loader::ImageLoadError;

/// The unified error type returned by the public API.
#[derive(Debug, Error)]
pub enum PagewrightError {
    /// JSON input failed to parse as a document, record bundle or config.
    #[error("Failed to parse input: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    #[error("Canvas error: {0}")]
    Canvas(#[from] CanvasError),
    #[error("Image error: {0}")]
    Image(String),
    /// The rendered document could not be written.
    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PagewrightError>;

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl PagewrightError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PagewrightError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ImageLoadError> for PagewrightError {
    fn from(e: ImageLoadError) -> Self {
        PagewrightError::Image(e.to_string())
    }
}

impl From<serde_json::Error> for PagewrightError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected schema. Check field names, block \"type\" tags and value types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PagewrightError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_carry_a_hint() {
        let err: PagewrightError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse input"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn eof_errors_mention_truncation() {
        let err: PagewrightError = serde_json::from_str::<serde_json::Value>("{\"a\": ")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn io_error_names_the_path() {
        let err = PagewrightError::io(
            "/tmp/out.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/out.pdf"));
    }
}
