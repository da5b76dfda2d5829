//! Request payload construction
//!
//! [`PayloadBuilder`] turns one [`ConversationMessage`] plus the session's
//! [`SystemPrompt`] into the JSON body for either `/api/generate` or
//! `/api/chat`. Only the latest message is sent; no history is replayed.

use crate::attachment::{classify, FileCategory};
use crate::conversation::{ConversationMessage, FilePayload, MessageContent, MessageKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default system prompt applied until the user changes it
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that provides accurate, concise information. If you don't know something, admit it rather than guessing.";

/// Sent instead of a blank system prompt
pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const DEFAULT_IMAGE_INSTRUCTION: &str =
    "Please analyze this image and describe what you see in detail.";
const DEFAULT_AUDIO_INSTRUCTION: &str = "Please transcribe and summarize this audio.";
const DEFAULT_DOCUMENT_INSTRUCTION: &str = "Please analyze this document.";
const DEFAULT_FILE_INSTRUCTION: &str = "Please analyze this file.";

/// Request form understood by the inference endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// `/api/generate` with a single `prompt`
    #[default]
    Generate,
    /// `/api/chat` with a `messages` list
    Chat,
}

impl EndpointKind {
    /// Parse an endpoint kind from a string
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "generate" => Ok(Self::Generate),
            "chat" => Ok(Self::Chat),
            other => Err(format!("Unknown endpoint kind: {}", other)),
        }
    }

    /// Path appended to the host
    pub fn path(&self) -> &'static str {
        match self {
            Self::Generate => "/api/generate",
            Self::Chat => "/api/chat",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate => write!(f, "generate"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// How audio attachments are handed to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioPolicy {
    /// Send base64 audio where the endpoint form has a field for it
    Inline,
    /// Send a text line naming the file
    #[default]
    Describe,
}

impl AudioPolicy {
    /// Parse an audio policy from a string
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "inline" | "base64" => Ok(Self::Inline),
            "describe" | "text" => Ok(Self::Describe),
            other => Err(format!("Unknown audio policy: {}", other)),
        }
    }
}

/// What the configured endpoint can accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointCapabilities {
    /// Request form
    pub kind: EndpointKind,
    /// A system-role message can be prepended
    pub chat_messages: bool,
    /// Inline audio is accepted
    pub inline_audio: bool,
}

impl EndpointCapabilities {
    /// Capabilities for an endpoint form under the given audio policy
    ///
    /// The chat form has no audio field, so inline audio is only honoured on
    /// the generate form.
    ///
    /// # Examples
    ///
    /// ```
    /// use gemma_chat::payload::{AudioPolicy, EndpointCapabilities, EndpointKind};
    ///
    /// let caps = EndpointCapabilities::for_endpoint(EndpointKind::Chat, AudioPolicy::Inline);
    /// assert!(caps.chat_messages);
    /// assert!(!caps.inline_audio);
    /// ```
    pub fn for_endpoint(kind: EndpointKind, audio_policy: AudioPolicy) -> Self {
        Self {
            kind,
            chat_messages: kind == EndpointKind::Chat,
            inline_audio: kind == EndpointKind::Generate && audio_policy == AudioPolicy::Inline,
        }
    }
}

/// System prompt owned by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt(String);

impl SystemPrompt {
    /// Wrap a prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self(prompt.into())
    }

    /// The prompt as set by the user
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The prompt that is actually sent: the fallback sentence when blank
    pub fn effective(&self) -> &str {
        if self.0.trim().is_empty() {
            FALLBACK_SYSTEM_PROMPT
        } else {
            &self.0
        }
    }
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl fmt::Display for SystemPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body for `/api/generate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

/// One entry of a `/api/chat` message list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Body for `/api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// A request body for either endpoint form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// Single-shot prompt form
    Generate(GenerateRequest),
    /// Message-list form
    Chat(ChatRequest),
}

impl RequestBody {
    /// Endpoint form of this body
    pub fn endpoint(&self) -> EndpointKind {
        match self {
            Self::Generate(_) => EndpointKind::Generate,
            Self::Chat(_) => EndpointKind::Chat,
        }
    }

    /// The user-facing text content of the request
    pub fn user_content(&self) -> &str {
        match self {
            Self::Generate(req) => &req.prompt,
            Self::Chat(req) => req
                .messages
                .iter()
                .rev()
                .find(|m| m.role == "user")
                .map(|m| m.content.as_str())
                .unwrap_or_default(),
        }
    }
}

/// Content plus inline attachments, before it is shaped for an endpoint
#[derive(Debug, Default, PartialEq, Eq)]
struct Prompt {
    content: String,
    image: Option<String>,
    audio: Option<String>,
}

/// Builds request bodies for the configured model and endpoint
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    model: String,
    capabilities: EndpointCapabilities,
}

impl PayloadBuilder {
    /// Create a builder
    ///
    /// # Examples
    ///
    /// ```
    /// use gemma_chat::payload::{AudioPolicy, EndpointCapabilities, EndpointKind, PayloadBuilder};
    ///
    /// let caps = EndpointCapabilities::for_endpoint(EndpointKind::Generate, AudioPolicy::Describe);
    /// let builder = PayloadBuilder::new("gemma3:4b", caps);
    /// assert_eq!(builder.model(), "gemma3:4b");
    /// ```
    pub fn new(model: impl Into<String>, capabilities: EndpointCapabilities) -> Self {
        Self {
            model: model.into(),
            capabilities,
        }
    }

    /// Model identifier placed in every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Capabilities the builder shapes requests for
    pub fn capabilities(&self) -> EndpointCapabilities {
        self.capabilities
    }

    /// Build the request body for a message
    ///
    /// # Examples
    ///
    /// ```
    /// use gemma_chat::conversation::{Conversation, MessageContent, MessageKind, Origin};
    /// use gemma_chat::payload::{
    ///     AudioPolicy, EndpointCapabilities, EndpointKind, PayloadBuilder, SystemPrompt,
    /// };
    ///
    /// let caps = EndpointCapabilities::for_endpoint(EndpointKind::Generate, AudioPolicy::Describe);
    /// let builder = PayloadBuilder::new("gemma3:4b", caps);
    /// let mut conversation = Conversation::new();
    /// let message = conversation
    ///     .append(Origin::User, MessageKind::Text, MessageContent::text("Hello"))
    ///     .clone();
    /// let body = builder.build(&message, &SystemPrompt::default());
    /// assert_eq!(body.user_content(), "Hello");
    /// ```
    pub fn build(&self, message: &ConversationMessage, system_prompt: &SystemPrompt) -> RequestBody {
        let prompt = match &message.content {
            MessageContent::Text { text } => Prompt {
                content: text.clone(),
                ..Prompt::default()
            },
            MessageContent::File(file) => {
                let category = match message.kind {
                    MessageKind::File(category) => category,
                    MessageKind::Text => classify(&file.mime_type),
                };
                self.file_prompt(file, category)
            }
        };

        tracing::debug!(
            "Built {} request for message #{} ({} chars, image={}, audio={})",
            self.capabilities.kind,
            message.id,
            prompt.content.len(),
            prompt.image.is_some(),
            prompt.audio.is_some()
        );

        if self.capabilities.chat_messages {
            let mut messages = vec![ChatMessage {
                role: "system".to_string(),
                content: system_prompt.effective().to_string(),
                images: Vec::new(),
            }];
            messages.push(ChatMessage {
                role: "user".to_string(),
                content: prompt.content,
                images: prompt.image.into_iter().collect(),
            });
            RequestBody::Chat(ChatRequest {
                model: self.model.clone(),
                messages,
                stream: false,
            })
        } else {
            RequestBody::Generate(GenerateRequest {
                model: self.model.clone(),
                prompt: prompt.content,
                stream: false,
                system: Some(system_prompt.effective().to_string()),
                image: prompt.image,
                audio: prompt.audio,
            })
        }
    }

    fn file_prompt(&self, file: &FilePayload, category: FileCategory) -> Prompt {
        match category {
            FileCategory::Image => match &file.inline_data {
                Some(data) => Prompt {
                    content: file
                        .context_text()
                        .unwrap_or(DEFAULT_IMAGE_INSTRUCTION)
                        .to_string(),
                    image: Some(data.clone()),
                    audio: None,
                },
                None => Prompt {
                    content: format!(
                        "[Image: {}] The image could not be encoded for upload.",
                        file.file_name
                    ),
                    ..Prompt::default()
                },
            },
            FileCategory::Audio => {
                let instruction = file.context_text().unwrap_or(DEFAULT_AUDIO_INSTRUCTION);
                match (&file.inline_data, self.capabilities.inline_audio) {
                    (Some(data), true) => Prompt {
                        content: instruction.to_string(),
                        image: None,
                        audio: Some(data.clone()),
                    },
                    _ => Prompt {
                        content: format!(
                            "[Audio file: {}] {} (type: {})",
                            file.file_name, instruction, file.mime_type
                        ),
                        ..Prompt::default()
                    },
                }
            }
            FileCategory::Document => {
                let instruction = file.context_text().unwrap_or(DEFAULT_DOCUMENT_INSTRUCTION);
                let content = match file.extracted_text.as_deref() {
                    Some(text) => format!(
                        "[Document: {}]\n\n{}\n\n{}",
                        file.file_name, text, instruction
                    ),
                    None => format!(
                        "[Document: {}]\n{}\nFile type: {}",
                        file.file_name, instruction, file.mime_type
                    ),
                };
                Prompt {
                    content,
                    ..Prompt::default()
                }
            }
            FileCategory::Video | FileCategory::Other => Prompt {
                content: format!(
                    "[File: {}] {} (type: {}, size: {} KB)",
                    file.file_name,
                    file.context_text().unwrap_or(DEFAULT_FILE_INSTRUCTION),
                    file.mime_type,
                    file.size_kb()
                ),
                ..Prompt::default()
            },
        }
    }
}
