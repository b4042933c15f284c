//! Error types for the oversolve-core library.
//!
//! This module provides granular error variants for different failure modes,
//! enabling precise error handling and user-facing alert messages.

use crate::answer::AnswerValidationError;
use crate::session::Phase;
use thiserror::Error;

/// Errors that can occur within the oversolve-core library.
///
/// Each variant represents a specific failure mode with contextual information
/// to help diagnose and handle errors appropriately.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The Gemini API key is missing or empty.
    #[error("Gemini API Key is missing.")]
    MissingCredential,

    /// Screen capture operation failed.
    #[error("Screen capture failed: {0}")]
    ScreenCapture(String),

    /// Requested screen/monitor index was not found.
    #[error("Screen not found: index {0}")]
    ScreenNotFound(usize),

    /// Image processing or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// The selection area is empty or has zero dimensions.
    #[error("Selection area is empty or invalid")]
    EmptySelection,

    /// The request to the Gemini API failed.
    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    /// Gemini answered, but the text is not JSON once fences are removed.
    #[error("Failed to parse AI response.")]
    UnparsableResponse,

    /// The parsed JSON does not describe a usable answer.
    #[error("Invalid answer from AI: {0}")]
    InvalidAnswer(#[from] AnswerValidationError),

    /// A session operation was attempted in the wrong phase.
    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: Phase,
        action: &'static str,
    },

    /// UI-related errors (rendering, window management).
    #[error("UI error: {0}")]
    Ui(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a screen capture error with the given message.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::ScreenCapture(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a Gemini API error with the given message.
    pub fn gemini(msg: impl Into<String>) -> Self {
        Self::GeminiApi(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
