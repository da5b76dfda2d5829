//! Ollama client implementation
//!
//! Sends non-streaming requests to a local or remote Ollama server and maps
//! the reply (or the failure) onto [`GemmaChatError`].

use crate::config::OllamaConfig;
use crate::error::{GemmaChatError, Result};
use crate::payload::{EndpointKind, RequestBody};
use crate::providers::{InferenceClient, ModelInfo};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Ollama API client
///
/// One POST per [`InferenceClient::send`] call. There is no retry and no
/// client-side timeout beyond reqwest's defaults.
///
/// # Examples
///
/// ```no_run
/// use gemma_chat::config::OllamaConfig;
/// use gemma_chat::payload::{GenerateRequest, RequestBody};
/// use gemma_chat::providers::{InferenceClient, OllamaClient};
///
/// # async fn example() -> gemma_chat::error::Result<()> {
/// let client = OllamaClient::new(&OllamaConfig::default())?;
/// let body = RequestBody::Generate(GenerateRequest {
///     model: "gemma3:4b".to_string(),
///     prompt: "Hello".to_string(),
///     stream: false,
///     system: None,
///     image: None,
///     audio: None,
/// });
/// let reply = client.send(&body).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
}

/// Response from `/api/generate`
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Response from `/api/chat`
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// Response from `/api/tags`
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModelTag>,
}

/// Model metadata from `/api/tags`
#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    modified_at: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use gemma_chat::config::OllamaConfig;
    /// use gemma_chat::providers::OllamaClient;
    ///
    /// let client = OllamaClient::new(&OllamaConfig::default()).unwrap();
    /// assert_eq!(client.host(), "http://localhost:11434");
    /// ```
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gemma-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                GemmaChatError::NetworkFailure(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!(
            "Initialized Ollama client: host={}, model={}, endpoint={}",
            config.host,
            config.model,
            config.endpoint
        );

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
        })
    }

    /// Configured host without a trailing slash
    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    /// Read the body of a response, mapping non-2xx statuses to errors
    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, body);
            return Err(GemmaChatError::NonSuccessStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        response.text().await.map_err(|e| {
            tracing::error!("Failed to read Ollama response body: {}", e);
            GemmaChatError::NetworkFailure(format!("Failed to read response: {}", e)).into()
        })
    }
}

/// Pull the reply text out of a response body for the given endpoint form
fn parse_reply(endpoint: EndpointKind, body: &str) -> Result<String> {
    let reply = match endpoint {
        EndpointKind::Generate => serde_json::from_str::<GenerateResponse>(body)
            .map(|r| r.response),
        EndpointKind::Chat => serde_json::from_str::<ChatResponse>(body)
            .map(|r| r.message.content),
    };

    reply.map_err(|e| {
        tracing::error!("Failed to parse Ollama {} response: {}", endpoint, e);
        GemmaChatError::MalformedResponse(e.to_string()).into()
    })
}

#[async_trait]
impl InferenceClient for OllamaClient {
    async fn send(&self, body: &RequestBody) -> Result<String> {
        let endpoint = body.endpoint();
        let url = self.url(endpoint.path());
        tracing::debug!("Sending Ollama {} request to {}", endpoint, url);

        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            tracing::error!("Ollama request failed: {}", e);
            GemmaChatError::NetworkFailure(e.to_string())
        })?;

        let text = Self::read_body(response).await?;
        let reply = parse_reply(endpoint, &text)?;
        tracing::debug!("Received {} chars from Ollama", reply.len());
        Ok(reply)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self.url("/api/tags");
        tracing::debug!("Fetching models from Ollama: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!("Failed to fetch Ollama models: {}", e);
            GemmaChatError::NetworkFailure(e.to_string())
        })?;

        let text = Self::read_body(response).await?;
        let tags: OllamaTagsResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to parse Ollama tags response: {}", e);
            GemmaChatError::MalformedResponse(e.to_string())
        })?;

        let models: Vec<ModelInfo> = tags
            .models
            .into_iter()
            .map(|tag| ModelInfo {
                name: tag.name,
                size: tag.size,
                modified_at: tag.modified_at,
            })
            .collect();

        tracing::debug!("Fetched {} models from Ollama", models.len());
        Ok(models)
    }
}
