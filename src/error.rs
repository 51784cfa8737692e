use std::path::PathBuf;

use thiserror::Error;

use crate::models::GenerationStep;

/// Errors raised by the text-generation client.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Response contained no text")]
    EmptyResponse,
}

/// Everything that can go wrong while assembling a book.
///
/// Only `CredentialMissing`, `Cancelled`, `Unexpected` and `Io` end a run.
/// The rest are logged by the driver and the affected artifact is skipped.
#[derive(Error, Debug)]
pub enum BookError {
    #[error("Gemini API key not found. Set GEMINI_API_KEY in .env or enter it manually")]
    CredentialMissing,

    #[error("{step} failed: {source}")]
    CollaboratorCallFailed {
        step: GenerationStep,
        #[source]
        source: LlmError,
    },

    #[error("Outline could not be parsed: {0}")]
    OutlineParseFailed(String),

    #[error("Failed to write {}: {source}", .path.display())]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("EPUB export failed: {0}")]
    ExportFailed(String),

    #[error("Book generation cancelled by user")]
    Cancelled,

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BookError {
    /// Whether the orchestrator must stop instead of skipping the step.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BookError::CredentialMissing
                | BookError::Cancelled
                | BookError::Unexpected(_)
                | BookError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BookError>;
