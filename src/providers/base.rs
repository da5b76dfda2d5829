//! Inference client abstraction
//!
//! The chat session only needs two things from a backend: send one request
//! body and get the reply text, and list the models it can serve.

use crate::error::Result;
use crate::payload::RequestBody;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A model the inference server has available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier (e.g., "gemma3:4b")
    pub name: String,
    /// Size on disk in bytes
    pub size: u64,
    /// Last modification time as reported by the server
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub modified_at: String,
}

impl ModelInfo {
    /// Create a new ModelInfo instance
    ///
    /// # Examples
    ///
    /// ```
    /// use gemma_chat::providers::ModelInfo;
    ///
    /// let model = ModelInfo::new("gemma3:4b", 3_338_801_804);
    /// assert_eq!(model.name, "gemma3:4b");
    /// assert_eq!(model.display_size(), "3.1GB");
    /// ```
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            modified_at: String::new(),
        }
    }

    /// Human-readable size
    pub fn display_size(&self) -> String {
        format_size(self.size)
    }
}

/// Backend that turns a request body into reply text
///
/// Implementations perform exactly one request per call and never retry.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use gemma_chat::error::Result;
/// use gemma_chat::payload::RequestBody;
/// use gemma_chat::providers::{InferenceClient, ModelInfo};
///
/// struct Echo;
///
/// #[async_trait]
/// impl InferenceClient for Echo {
///     async fn send(&self, body: &RequestBody) -> Result<String> {
///         Ok(body.user_content().to_string())
///     }
///
///     async fn list_models(&self) -> Result<Vec<ModelInfo>> {
///         Ok(vec![])
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send one request and return the reply text
    ///
    /// # Errors
    ///
    /// Returns `NetworkFailure`, `NonSuccessStatus` or `MalformedResponse`
    async fn send(&self, body: &RequestBody) -> Result<String>;

    /// List the models available on the server
    ///
    /// # Errors
    ///
    /// Returns the same error kinds as [`InferenceClient::send`]
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}

/// Format byte size for display
pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.1}{}", size, UNITS[unit_idx])
}
