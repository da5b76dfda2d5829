//! Gemma Chat - terminal chat front-end library
//!
//! This library turns user text and files into requests for a locally
//! hosted Ollama model and maps the replies back into a conversation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `attachment`: File loading, size limit, MIME classification, text
//!   extraction and inline encoding
//! - `payload`: Request body construction for the generate and chat endpoints
//! - `providers`: Inference client abstraction and the Ollama implementation
//! - `conversation`: Message model and the append-only conversation
//! - `session`: Chat session state (conversation, system prompt, errors)
//! - `config`: Configuration management and validation
//! - `theme`: Terminal colour themes
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use gemma_chat::payload::{EndpointCapabilities, PayloadBuilder, SystemPrompt};
//! use gemma_chat::providers::OllamaClient;
//! use gemma_chat::{ChatSession, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let caps = EndpointCapabilities::for_endpoint(
//!         config.ollama.endpoint,
//!         config.ollama.audio_policy,
//!     );
//!     let builder = PayloadBuilder::new(config.ollama.model.clone(), caps);
//!     let client = OllamaClient::new(&config.ollama)?;
//!     let mut session = ChatSession::new(client, builder, SystemPrompt::default());
//!
//!     if let Some(reply) = session.send_text("Tell me a fun fact").await? {
//!         println!("{}", reply);
//!     }
//!     Ok(())
//! }
//! ```

pub mod attachment;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod payload;
pub mod providers;
pub mod session;
pub mod theme;

// Re-export commonly used types
pub use attachment::{classify, AttachedFile, FileCategory};
pub use config::Config;
pub use conversation::{Conversation, ConversationMessage, MessageContent, MessageKind, Origin};
pub use error::{GemmaChatError, Result};
pub use payload::{PayloadBuilder, RequestBody, SystemPrompt};
pub use session::{ChatSession, ChatState};
