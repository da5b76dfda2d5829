//! Configuration management for Gemma Chat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::attachment::DEFAULT_MAX_FILE_SIZE;
use crate::error::{GemmaChatError, Result};
use crate::payload::{AudioPolicy, EndpointKind, DEFAULT_SYSTEM_PROMPT};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Gemma Chat
///
/// Model and endpoint settings are fixed for the life of the process; only
/// the system prompt can change at runtime, and that lives in the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Inference endpoint configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Chat front-end configuration
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Ollama endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server base URL
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model identifier sent with every request
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Which request form to use (`generate` or `chat`)
    #[serde(default)]
    pub endpoint: EndpointKind,

    /// Whether audio is sent inline or described by name
    #[serde(default)]
    pub audio_policy: AudioPolicy,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "gemma3:4b".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            endpoint: EndpointKind::default(),
            audio_policy: AudioPolicy::default(),
        }
    }
}

/// Chat front-end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Initial system prompt for new sessions
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Largest attachment accepted (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Colour theme for terminal output
    #[serde(default)]
    pub theme: Theme,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_file_size_bytes: default_max_file_size(),
            theme: Theme::default(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GemmaChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| GemmaChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(host) = std::env::var("GEMMA_CHAT_OLLAMA_HOST") {
            self.ollama.host = host;
        }

        if let Ok(model) = std::env::var("GEMMA_CHAT_MODEL") {
            self.ollama.model = model;
        }

        if let Ok(endpoint) = std::env::var("GEMMA_CHAT_ENDPOINT") {
            match EndpointKind::parse_str(&endpoint) {
                Ok(kind) => self.ollama.endpoint = kind,
                Err(e) => tracing::warn!("Invalid GEMMA_CHAT_ENDPOINT: {}", e),
            }
        }

        if let Ok(policy) = std::env::var("GEMMA_CHAT_AUDIO_POLICY") {
            match AudioPolicy::parse_str(&policy) {
                Ok(policy) => self.ollama.audio_policy = policy,
                Err(e) => tracing::warn!("Invalid GEMMA_CHAT_AUDIO_POLICY: {}", e),
            }
        }

        if let Ok(prompt) = std::env::var("GEMMA_CHAT_SYSTEM_PROMPT") {
            self.chat.system_prompt = prompt;
        }

        if let Ok(max_size) = std::env::var("GEMMA_CHAT_MAX_FILE_SIZE") {
            if let Ok(value) = max_size.parse() {
                self.chat.max_file_size_bytes = value;
            } else {
                tracing::warn!("Invalid GEMMA_CHAT_MAX_FILE_SIZE: {}", max_size);
            }
        }

        if let Ok(theme) = std::env::var("GEMMA_CHAT_THEME") {
            match Theme::parse_str(&theme) {
                Ok(theme) => self.chat.theme = theme,
                Err(e) => tracing::warn!("Invalid GEMMA_CHAT_THEME: {}", e),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(host) = &cli.host {
            self.ollama.host = host.clone();
        }

        if let Some(model) = &cli.model {
            self.ollama.model = model.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the host is not an http(s) URL, the model is empty,
    /// or the attachment limit is zero
    pub fn validate(&self) -> Result<()> {
        let host = url::Url::parse(&self.ollama.host).map_err(|e| {
            GemmaChatError::Config(format!("Invalid Ollama host '{}': {}", self.ollama.host, e))
        })?;

        if !matches!(host.scheme(), "http" | "https") {
            return Err(GemmaChatError::Config(format!(
                "Ollama host must use http or https, got: {}",
                host.scheme()
            ))
            .into());
        }

        if self.ollama.model.trim().is_empty() {
            return Err(GemmaChatError::Config("Model cannot be empty".to_string()).into());
        }

        if self.chat.max_file_size_bytes == 0 {
            return Err(GemmaChatError::Config(
                "chat.max_file_size_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn cli_without_overrides() -> crate::cli::Cli {
        crate::cli::Cli::default()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.ollama.model, "gemma3:4b");
        assert_eq!(config.ollama.endpoint, EndpointKind::Generate);
        assert_eq!(config.ollama.audio_policy, AudioPolicy::Describe);
        assert_eq!(config.chat.max_file_size_bytes, 10_485_760);
        assert_eq!(config.chat.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_host() {
        let mut config = Config::default();
        config.ollama.host = "not a url".to_string();
        assert!(config.validate().is_err());

        config.ollama.host = "ftp://localhost:11434".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_model() {
        let mut config = Config::default();
        config.ollama.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_file_limit() {
        let mut config = Config::default();
        config.chat.max_file_size_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
ollama:
  host: http://gpu-box:11434
  model: llava:13b
  endpoint: chat
  audio_policy: inline
chat:
  system_prompt: Be brief.
  max_file_size_bytes: 2048
  theme: violet
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.ollama.host, "http://gpu-box:11434");
        assert_eq!(config.ollama.model, "llava:13b");
        assert_eq!(config.ollama.endpoint, EndpointKind::Chat);
        assert_eq!(config.ollama.audio_policy, AudioPolicy::Inline);
        assert_eq!(config.chat.system_prompt, "Be brief.");
        assert_eq!(config.chat.max_file_size_bytes, 2048);
        assert_eq!(config.chat.theme, Theme::Violet);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("ollama:\n  model: phi3\n").unwrap();
        assert_eq!(config.ollama.model, "phi3");
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.chat.max_file_size_bytes, 10_485_760);
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let config = Config::load("nonexistent.yaml", &cli_without_overrides()).unwrap();
        assert_eq!(config.ollama.model, "gemma3:4b");
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_fields() {
        std::env::set_var("GEMMA_CHAT_OLLAMA_HOST", "http://10.0.0.2:11434");
        std::env::set_var("GEMMA_CHAT_MODEL", "llama3.2:latest");
        std::env::set_var("GEMMA_CHAT_ENDPOINT", "chat");
        std::env::set_var("GEMMA_CHAT_MAX_FILE_SIZE", "4096");
        std::env::set_var("GEMMA_CHAT_THEME", "plain");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("GEMMA_CHAT_OLLAMA_HOST");
        std::env::remove_var("GEMMA_CHAT_MODEL");
        std::env::remove_var("GEMMA_CHAT_ENDPOINT");
        std::env::remove_var("GEMMA_CHAT_MAX_FILE_SIZE");
        std::env::remove_var("GEMMA_CHAT_THEME");

        assert_eq!(config.ollama.host, "http://10.0.0.2:11434");
        assert_eq!(config.ollama.model, "llama3.2:latest");
        assert_eq!(config.ollama.endpoint, EndpointKind::Chat);
        assert_eq!(config.chat.max_file_size_bytes, 4096);
        assert_eq!(config.chat.theme, Theme::Plain);
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_ignores_invalid_values() {
        std::env::set_var("GEMMA_CHAT_MAX_FILE_SIZE", "ten megabytes");
        std::env::set_var("GEMMA_CHAT_ENDPOINT", "completions");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("GEMMA_CHAT_MAX_FILE_SIZE");
        std::env::remove_var("GEMMA_CHAT_ENDPOINT");

        assert_eq!(config.chat.max_file_size_bytes, 10_485_760);
        assert_eq!(config.ollama.endpoint, EndpointKind::Generate);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_take_precedence() {
        let mut cli = cli_without_overrides();
        cli.host = Some("http://cli-host:11434".to_string());
        cli.model = Some("mistral".to_string());

        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert_eq!(config.ollama.host, "http://cli-host:11434");
        assert_eq!(config.ollama.model, "mistral");
    }
}
