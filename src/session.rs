//! Chat session state
//!
//! [`ChatSession`] owns everything that changes while the user chats: the
//! conversation, the system prompt, the last error and the
//! `idle -> sending -> idle` state. Sends take `&mut self`, so a session can
//! never have two requests in flight.

use crate::attachment::{
    check_size, extract_text, to_inline_encoding, AttachedFile, FileCategory,
    DEFAULT_MAX_FILE_SIZE,
};
use crate::conversation::{
    Conversation, ConversationMessage, FilePayload, MessageContent, MessageKind, Origin,
};
use crate::error::{describe, Result};
use crate::payload::{PayloadBuilder, SystemPrompt};
use crate::providers::InferenceClient;
use std::path::Path;
use std::sync::Arc;

/// Request state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    /// Ready for input
    #[default]
    Idle,
    /// Waiting for the model to reply
    Sending,
}

/// Build the payload for an attachment
///
/// Runs text extraction and inline encoding. An extraction failure is an
/// error; an encoding failure is logged and the payload goes out without
/// inline bytes, so the request falls back to a descriptive line.
///
/// # Errors
///
/// Returns `ExtractionFailure` if a PDF cannot be read
pub async fn build_file_payload(file: &AttachedFile, context: Option<&str>) -> Result<FilePayload> {
    let extracted_text = extract_text(file).await?;

    let inline_data = match to_inline_encoding(file) {
        Ok(inline) => inline.map(|i| i.base64),
        Err(e) => {
            tracing::warn!("Sending {} without inline data: {}", file.name, e);
            None
        }
    };

    Ok(FilePayload {
        file_reference: file.reference.clone(),
        file_name: file.name.clone(),
        mime_type: file.mime_type.clone(),
        size_bytes: file.size(),
        context: context.map(str::to_string),
        inline_data,
        extracted_text,
    })
}

/// One conversation with the model
pub struct ChatSession {
    client: Arc<dyn InferenceClient>,
    builder: PayloadBuilder,
    conversation: Conversation,
    system_prompt: SystemPrompt,
    state: ChatState,
    last_error: Option<String>,
    max_file_size: u64,
}

impl ChatSession {
    /// Creates a new session
    ///
    /// # Arguments
    ///
    /// * `client` - Backend used to send requests
    /// * `builder` - Payload builder for the configured model and endpoint
    /// * `system_prompt` - Initial system prompt
    pub fn new(
        client: impl InferenceClient + 'static,
        builder: PayloadBuilder,
        system_prompt: SystemPrompt,
    ) -> Self {
        Self::new_boxed(Box::new(client), builder, system_prompt)
    }

    /// Creates a new session from a boxed client
    pub fn new_boxed(
        client: Box<dyn InferenceClient>,
        builder: PayloadBuilder,
        system_prompt: SystemPrompt,
    ) -> Self {
        Self {
            client: Arc::from(client),
            builder,
            conversation: Conversation::new(),
            system_prompt,
            state: ChatState::Idle,
            last_error: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set the attachment size limit
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Current request state
    pub fn state(&self) -> ChatState {
        self.state
    }

    /// All messages in order
    pub fn messages(&self) -> &[ConversationMessage] {
        self.conversation.messages()
    }

    /// The payload builder in use
    pub fn builder(&self) -> &PayloadBuilder {
        &self.builder
    }

    /// The system prompt applied to the next request
    pub fn system_prompt(&self) -> &SystemPrompt {
        &self.system_prompt
    }

    /// Replace the system prompt for every later request
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = SystemPrompt::new(prompt);
        tracing::info!("System prompt updated");
    }

    /// Inline message for the most recent failure, if not yet dismissed
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Hide the last error
    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Drop every message and any pending error
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.last_error = None;
        tracing::info!("Conversation cleared");
    }

    /// Send a text message
    ///
    /// Blank input is ignored and returns `Ok(None)` without touching the
    /// conversation.
    ///
    /// # Errors
    ///
    /// Returns the client error; the user message stays in the conversation
    pub async fn send_text(&mut self, text: &str) -> Result<Option<String>> {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring blank input");
            return Ok(None);
        }

        self.dispatch(MessageKind::Text, MessageContent::text(text))
            .await
            .map(Some)
    }

    /// Send a file that is already in memory
    ///
    /// The payload is fully prepared before anything is recorded, so a
    /// rejected or unreadable file leaves the conversation unchanged.
    ///
    /// # Errors
    ///
    /// Returns `FileTooLarge` or `ExtractionFailure` before sending, or the
    /// client error after the user message has been recorded
    pub async fn send_file(&mut self, file: &AttachedFile, context: Option<&str>) -> Result<String> {
        let payload = match self.prepare(file, context).await {
            Ok(payload) => payload,
            Err(e) => {
                self.last_error = Some(describe(&e));
                return Err(e);
            }
        };

        let category: FileCategory = file.category();
        self.dispatch(MessageKind::File(category), MessageContent::File(payload))
            .await
    }

    /// Load a file from disk and send it
    ///
    /// # Errors
    ///
    /// Same as [`ChatSession::send_file`], plus `Io` when the path cannot be
    /// read
    pub async fn send_path(&mut self, path: &Path, context: Option<&str>) -> Result<String> {
        let file = match AttachedFile::from_path(path, self.max_file_size).await {
            Ok(file) => file,
            Err(e) => {
                self.last_error = Some(describe(&e));
                return Err(e);
            }
        };
        self.send_file(&file, context).await
    }

    async fn prepare(&self, file: &AttachedFile, context: Option<&str>) -> Result<FilePayload> {
        check_size(file.size(), self.max_file_size)?;
        build_file_payload(file, context).await
    }

    async fn dispatch(&mut self, kind: MessageKind, content: MessageContent) -> Result<String> {
        let message = self
            .conversation
            .append(Origin::User, kind, content)
            .clone();
        let body = self.builder.build(&message, &self.system_prompt);

        self.state = ChatState::Sending;
        self.last_error = None;
        let client = Arc::clone(&self.client);
        let result = client.send(&body).await;
        self.state = ChatState::Idle;

        match result {
            Ok(reply) => {
                self.conversation.append(
                    Origin::Assistant,
                    MessageKind::Text,
                    MessageContent::text(reply.clone()),
                );
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!("Request for message #{} failed: {}", message.id, e);
                self.last_error = Some(describe(&e));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GemmaChatError;
    use crate::payload::{
        AudioPolicy, EndpointCapabilities, EndpointKind, RequestBody, FALLBACK_SYSTEM_PROMPT,
    };
    use crate::providers::MockInferenceClient;

    fn builder(kind: EndpointKind) -> PayloadBuilder {
        PayloadBuilder::new(
            "gemma3:4b",
            EndpointCapabilities::for_endpoint(kind, AudioPolicy::Describe),
        )
    }

    fn session(mock: MockInferenceClient) -> ChatSession {
        ChatSession::new(mock, builder(EndpointKind::Generate), SystemPrompt::default())
    }

    #[tokio::test]
    async fn test_send_text_appends_user_and_assistant() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send()
            .withf(|body: &RequestBody| body.user_content() == "Hello")
            .times(1)
            .returning(|_| Ok("Hi".to_string()));

        let mut session = session(mock);
        let reply = session.send_text("Hello").await.unwrap();

        assert_eq!(reply.as_deref(), Some("Hi"));
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].origin, Origin::User);
        assert_eq!(messages[0].content, MessageContent::text("Hello"));
        assert_eq!(messages[1].origin, Origin::Assistant);
        assert_eq!(messages[1].content, MessageContent::text("Hi"));
        assert_ne!(messages[0].id, messages[1].id);
        assert_eq!(session.state(), ChatState::Idle);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send().times(0);

        let mut session = session(mock);
        assert!(session.send_text("   \n\t").await.unwrap().is_none());
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_user_message_and_sets_error() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send()
            .times(1)
            .returning(|_| Err(GemmaChatError::NetworkFailure("refused".into()).into()));

        let mut session = session(mock);
        let err = session.send_text("Hello").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<GemmaChatError>(),
            Some(GemmaChatError::NetworkFailure(_))
        ));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].origin, Origin::User);
        assert!(session.last_error().unwrap().contains("ollama serve"));
        assert_eq!(session.state(), ChatState::Idle);

        session.dismiss_error();
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_successful_send_clears_previous_error() {
        let mut mock = MockInferenceClient::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(GemmaChatError::NonSuccessStatus {
                    status: 500,
                    body: String::new(),
                }
                .into())
            });
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("recovered".to_string()));

        let mut session = session(mock);
        assert!(session.send_text("first").await.is_err());
        assert!(session.last_error().is_some());

        session.send_text("second").await.unwrap();
        assert!(session.last_error().is_none());
        assert_eq!(session.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_system_prompt_change_applies_to_next_request() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send()
            .withf(|body: &RequestBody| match body {
                RequestBody::Chat(req) => req.messages[0].content == "Reply in French.",
                _ => false,
            })
            .times(1)
            .returning(|_| Ok("Bonjour".to_string()));

        let mut session = ChatSession::new(mock, builder(EndpointKind::Chat), SystemPrompt::default());
        session.set_system_prompt("Reply in French.");
        session.send_text("Hello").await.unwrap();
        assert_eq!(session.system_prompt().as_str(), "Reply in French.");
    }

    #[tokio::test]
    async fn test_blank_system_prompt_sends_fallback() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send()
            .withf(|body: &RequestBody| match body {
                RequestBody::Generate(req) => req.system.as_deref() == Some(FALLBACK_SYSTEM_PROMPT),
                _ => false,
            })
            .times(1)
            .returning(|_| Ok("ok".to_string()));

        let mut session = session(mock);
        session.set_system_prompt("");
        session.send_text("Hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_before_send() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send().times(0);

        let mut session = session(mock).with_max_file_size(16);
        let file = AttachedFile::new("big.bin", "application/octet-stream", vec![0u8; 17]);
        let err = session.send_file(&file, None).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<GemmaChatError>(),
            Some(GemmaChatError::FileTooLarge { size: 17, limit: 16 })
        ));
        assert!(session.messages().is_empty());
        assert!(session.last_error().unwrap().contains("too large"));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_leaves_conversation_unchanged() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send().times(0);

        let mut session = session(mock);
        let file = AttachedFile::new(
            "broken.pdf",
            "application/pdf",
            b"%PDF-1.4\nnot a real document".to_vec(),
        );
        let err = session.send_file(&file, Some("summarize")).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<GemmaChatError>(),
            Some(GemmaChatError::ExtractionFailure(_))
        ));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_send_text_file_embeds_content() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send()
            .withf(|body: &RequestBody| {
                body.user_content()
                    == "[Document: notes.txt]\n\nbuy milk\n\nWhat should I buy?"
            })
            .times(1)
            .returning(|_| Ok("Milk".to_string()));

        let mut session = session(mock);
        let file = AttachedFile::new("notes.txt", "text/plain", b"buy milk".to_vec());
        let reply = session
            .send_file(&file, Some("What should I buy?"))
            .await
            .unwrap();

        assert_eq!(reply, "Milk");
        assert_eq!(
            session.messages()[0].kind,
            MessageKind::File(FileCategory::Document)
        );
    }

    #[tokio::test]
    async fn test_empty_image_falls_back_to_placeholder() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send()
            .withf(|body: &RequestBody| match body {
                RequestBody::Generate(req) => {
                    req.image.is_none()
                        && req.prompt
                            == "[Image: blank.png] The image could not be encoded for upload."
                }
                _ => false,
            })
            .times(1)
            .returning(|_| Ok("I cannot see it".to_string()));

        let mut session = session(mock);
        let file = AttachedFile::new("blank.png", "image/png", Vec::new());
        session.send_file(&file, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_path_missing_file_is_io_error() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send().times(0);

        let mut session = session(mock);
        let err = session
            .send_path(Path::new("/definitely/not/here.png"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GemmaChatError>(),
            Some(GemmaChatError::Io(_))
        ));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_clear_resets_messages_and_error() {
        let mut mock = MockInferenceClient::new();
        mock.expect_send()
            .times(1)
            .returning(|_| Err(GemmaChatError::MalformedResponse("x".into()).into()));

        let mut session = session(mock);
        let _ = session.send_text("Hello").await;
        session.clear();
        assert!(session.messages().is_empty());
        assert!(session.last_error().is_none());
    }
}
