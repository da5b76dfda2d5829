//! Error types for Gemma Chat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Gemma Chat operations
///
/// The first six variants form the user-facing taxonomy: every one of them is
/// recovered at the UI boundary and rendered as an inline message. The rest
/// cover configuration loading and plumbing.
#[derive(Error, Debug)]
pub enum GemmaChatError {
    /// The inference endpoint could not be reached
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The inference endpoint answered with a non-2xx status
    #[error("Inference endpoint returned status {status}: {body}")]
    NonSuccessStatus {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The response was not JSON or lacked the reply field
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Text could not be extracted from an attachment
    #[error("Text extraction failed: {0}")]
    ExtractionFailure(String),

    /// An attachment could not be encoded or decoded
    #[error("Encoding failed: {0}")]
    EncodingFailure(String),

    /// Attachment exceeds the configured size limit
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge {
        /// Size of the rejected file
        size: u64,
        /// Configured limit
        limit: u64,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GemmaChatError {
    /// Short message suitable for the inline error line of the chat UI
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkFailure(_) => {
                "Could not reach the model server. Make sure Ollama is running with: ollama serve"
                    .to_string()
            }
            Self::NonSuccessStatus { status, .. } => {
                format!("The model server returned an error (status {})", status)
            }
            Self::MalformedResponse(_) => "The model server sent an unexpected reply".to_string(),
            Self::FileTooLarge { limit, .. } => format!(
                "File is too large. Maximum size is {} MB",
                limit / (1024 * 1024)
            ),
            other => other.to_string(),
        }
    }
}

/// Result type alias for Gemma Chat operations
///
/// Uses `anyhow::Error` so context can be attached while the typed
/// [`GemmaChatError`] stays recoverable with `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;

/// Inline message for any error that reaches the UI boundary
pub fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GemmaChatError>() {
        Some(e) => e.user_message(),
        None => err.to_string(),
    }
}
