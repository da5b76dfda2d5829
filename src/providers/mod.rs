//! Inference backends for Gemma Chat
//!
//! This module contains the client abstraction and the Ollama
//! implementation.

pub mod base;
pub mod ollama;

pub use base::{InferenceClient, ModelInfo};
pub use ollama::OllamaClient;

#[cfg(test)]
pub use base::MockInferenceClient;

use crate::config::OllamaConfig;
use crate::error::Result;

/// Create the inference client described by the configuration
///
/// # Errors
///
/// Returns error if client initialization fails
pub fn create_client(config: &OllamaConfig) -> Result<Box<dyn InferenceClient>> {
    Ok(Box::new(OllamaClient::new(config)?))
}
