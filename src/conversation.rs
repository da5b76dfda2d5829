//! Conversation messages and the append-only conversation log
//!
//! Every message gets a sequence id from the owning [`Conversation`]. The id
//! is the unique key; `created_at` is only for display and may repeat when
//! two messages are created within one clock tick.

use crate::attachment::FileCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// File-bearing message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    /// Local reference to the file (`file://`, `data:` or `memory://`)
    pub file_reference: String,
    /// Display name
    pub file_name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Text the user typed alongside the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Bare base64 bytes for image and audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<String>,
    /// Extracted document text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

impl FilePayload {
    /// Context text if the user supplied any non-blank text
    pub fn context_text(&self) -> Option<&str> {
        self.context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Size rounded to whole kilobytes
    pub fn size_kb(&self) -> u64 {
        (self.size_bytes as f64 / 1024.0).round() as u64
    }
}

/// Body of a message: plain text or a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    /// Text-only message
    Text {
        /// The text as typed
        text: String,
    },
    /// File-bearing message
    File(FilePayload),
}

impl MessageContent {
    /// Text-only content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Short human-readable rendering for terminal output
    pub fn display_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::File(file) => match file.context_text() {
                Some(ctx) => format!("[{}] {}", file.file_name, ctx),
                None => format!("[{}]", file.file_name),
            },
        }
    }
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Typed or attached by the user
    User,
    /// Returned by the model
    Assistant,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// Kind of a message, used to pick the payload rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text
    Text,
    /// Attachment of the given category
    File(FileCategory),
}

/// One entry of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Sequence id, unique within the conversation
    pub id: u64,
    /// Message body
    pub content: MessageContent,
    /// Who produced it
    pub origin: Origin,
    /// Text or file category
    pub kind: MessageKind,
    /// Wall-clock creation time (display only)
    pub created_at: DateTime<Utc>,
}

/// Append-only ordered sequence of messages
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    next_id: u64,
}

impl Conversation {
    /// Creates an empty conversation
    ///
    /// # Examples
    ///
    /// ```
    /// use gemma_chat::conversation::Conversation;
    ///
    /// let conversation = Conversation::new();
    /// assert!(conversation.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return it
    ///
    /// Ids keep increasing across [`Conversation::clear`].
    ///
    /// # Examples
    ///
    /// ```
    /// use gemma_chat::conversation::{Conversation, MessageContent, MessageKind, Origin};
    ///
    /// let mut conversation = Conversation::new();
    /// let a = conversation.append(Origin::User, MessageKind::Text, MessageContent::text("a")).id;
    /// let b = conversation.append(Origin::User, MessageKind::Text, MessageContent::text("b")).id;
    /// assert!(b > a);
    /// ```
    pub fn append(
        &mut self,
        origin: Origin,
        kind: MessageKind,
        content: MessageContent,
    ) -> &ConversationMessage {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ConversationMessage {
            id,
            content,
            origin,
            kind,
            created_at: Utc::now(),
        });
        tracing::debug!("Appended {} message #{}", origin, id);
        &self.messages[self.messages.len() - 1]
    }

    /// All messages in order
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Most recent message
    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
