//! Command-line interface definition for Gemma Chat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions and
//! model listing.

use crate::theme::Theme;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gemma Chat - terminal chat front-end for a local Ollama model
///
/// Send text, images, audio and documents to a locally hosted model
/// and read the replies in your terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "gemma-chat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Ollama server URL (overrides config and environment)
    #[arg(long)]
    pub host: Option<String>,

    /// Model identifier (overrides config and environment)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Gemma Chat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// System prompt for this session
        #[arg(short, long)]
        system: Option<String>,

        /// Colour theme (midnight, violet, plain)
        #[arg(short, long, value_parser = Theme::parse_str)]
        theme: Option<Theme>,
    },

    /// Ask a single question and print the reply
    Ask {
        /// Question text, or context for the attached file
        prompt: Option<String>,

        /// File to attach to the question
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// System prompt for this question
        #[arg(short, long)]
        system: Option<String>,
    },

    /// Manage AI models
    Models {
        /// Model management subcommand
        #[command(subcommand)]
        command: ModelCommand,
    },
}

/// Model management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ModelCommand {
    /// List models available on the Ollama server
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            host: None,
            model: None,
            command: Commands::Chat {
                system: None,
                theme: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(cli.host.is_none());
        assert!(cli.model.is_none());
        assert!(matches!(cli.command, Commands::Chat { .. }));
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["gemma-chat", "chat"]).unwrap();
        if let Commands::Chat { system, theme } = cli.command {
            assert!(system.is_none());
            assert!(theme.is_none());
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_chat_with_system_and_theme() {
        let cli = Cli::try_parse_from([
            "gemma-chat",
            "chat",
            "--system",
            "Answer like a pirate",
            "--theme",
            "violet",
        ])
        .unwrap();
        if let Commands::Chat { system, theme } = cli.command {
            assert_eq!(system.as_deref(), Some("Answer like a pirate"));
            assert_eq!(theme, Some(Theme::Violet));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_chat_rejects_unknown_theme() {
        let cli = Cli::try_parse_from(["gemma-chat", "chat", "--theme", "sepia"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_ask_with_prompt() {
        let cli = Cli::try_parse_from(["gemma-chat", "ask", "Tell me a fun fact"]).unwrap();
        if let Commands::Ask {
            prompt,
            file,
            system,
        } = cli.command
        {
            assert_eq!(prompt.as_deref(), Some("Tell me a fun fact"));
            assert!(file.is_none());
            assert!(system.is_none());
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_ask_with_file() {
        let cli = Cli::try_parse_from([
            "gemma-chat",
            "ask",
            "What is in this picture?",
            "--file",
            "cat.png",
        ])
        .unwrap();
        if let Commands::Ask { prompt, file, .. } = cli.command {
            assert_eq!(prompt.as_deref(), Some("What is in this picture?"));
            assert_eq!(file, Some(PathBuf::from("cat.png")));
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_ask_file_only() {
        let cli = Cli::try_parse_from(["gemma-chat", "ask", "-f", "report.pdf"]).unwrap();
        if let Commands::Ask { prompt, file, .. } = cli.command {
            assert!(prompt.is_none());
            assert_eq!(file, Some(PathBuf::from("report.pdf")));
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "gemma-chat",
            "--host",
            "http://gpu-box:11434",
            "--model",
            "llava:13b",
            "chat",
        ])
        .unwrap();
        assert_eq!(cli.host.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(cli.model.as_deref(), Some("llava:13b"));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::try_parse_from(["gemma-chat", "--config", "custom.yaml", "chat"]).unwrap();
        assert_eq!(cli.config, Some("custom.yaml".to_string()));
    }

    #[test]
    fn test_cli_parse_with_verbose() {
        let cli = Cli::try_parse_from(["gemma-chat", "-v", "chat"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_missing_command() {
        let cli = Cli::try_parse_from(["gemma-chat"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_invalid_command() {
        let cli = Cli::try_parse_from(["gemma-chat", "invalid"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_models_list() {
        let cli = Cli::try_parse_from(["gemma-chat", "models", "list"]).unwrap();
        if let Commands::Models {
            command: ModelCommand::List { json },
        } = cli.command
        {
            assert!(!json);
        } else {
            panic!("Expected Models List command");
        }
    }

    #[test]
    fn test_cli_parse_models_list_json() {
        let cli = Cli::try_parse_from(["gemma-chat", "models", "list", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Models {
                command: ModelCommand::List { json: true }
            }
        ));
    }
}
