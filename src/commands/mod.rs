/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`: Interactive chat loop
- `ask`: One-shot question, optionally with an attached file
- `models`: Model listing

The handlers stay thin: the session, payload builder and client do the work.
*/

use crate::config::Config;
use crate::error::{describe, Result};
use crate::payload::{EndpointCapabilities, PayloadBuilder, SystemPrompt};
use crate::providers;
use crate::session::ChatSession;

// Special commands parser for the chat loop
pub mod special_commands;

// Model management commands
pub mod models;

/// Build a session from configuration and an optional prompt override
fn build_session(config: &Config, system: Option<String>) -> Result<ChatSession> {
    let client = providers::create_client(&config.ollama)?;
    let capabilities =
        EndpointCapabilities::for_endpoint(config.ollama.endpoint, config.ollama.audio_policy);
    let builder = PayloadBuilder::new(config.ollama.model.clone(), capabilities);
    let prompt = system.unwrap_or_else(|| config.chat.system_prompt.clone());

    Ok(
        ChatSession::new_boxed(client, builder, SystemPrompt::new(prompt))
            .with_max_file_size(config.chat.max_file_size_bytes),
    )
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Creates a [`ChatSession`] and runs a readline-based loop that sends
    //! user input to the model and prints the replies.

    use super::*;
    use crate::attachment::{AttachedFile, ImagePreview};
    use crate::commands::special_commands::{
        parse_special_command, print_examples, print_help, SpecialCommand, EXAMPLE_PROMPTS,
    };
    use crate::theme::Theme;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::path::Path;

    /// Start the interactive chat loop
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `system` - Optional system prompt for this session
    /// * `theme` - Optional theme override
    ///
    /// # Errors
    ///
    /// Returns error if the client or the line editor cannot be created.
    /// Request failures are printed inline and do not end the loop.
    pub async fn run_chat(config: Config, system: Option<String>, theme: Option<Theme>) -> Result<()> {
        tracing::info!("Starting interactive chat");

        let theme = theme.unwrap_or(config.chat.theme);
        let mut session = build_session(&config, system)?;
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config, theme);
        print_examples();

        loop {
            let prompt = theme.format_prompt(&config.ollama.model);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    rl.add_history_entry(trimmed)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            println!("{}\n", theme.error(&e.to_string()));
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Help => print_help(),
                        SpecialCommand::Examples => print_examples(),
                        SpecialCommand::ShowStatus => print_status_display(&session, &config),
                        SpecialCommand::DismissError => {
                            session.dismiss_error();
                            println!("{}\n", theme.muted("Error dismissed."));
                        }
                        SpecialCommand::ShowSystemPrompt => {
                            println!("\nSystem prompt:\n{}\n", session.system_prompt());
                        }
                        SpecialCommand::SetSystemPrompt(prompt) => {
                            session.set_system_prompt(prompt);
                            println!("{}\n", theme.muted("System prompt updated."));
                        }
                        SpecialCommand::Clear => {
                            session.clear();
                            println!("{}\n", theme.muted("Conversation cleared."));
                            print_examples();
                        }
                        SpecialCommand::Example(idx) => {
                            let text = EXAMPLE_PROMPTS[idx];
                            println!("{}: {}", theme.user_label(), text);
                            send_text(&mut session, theme, text).await;
                        }
                        SpecialCommand::Attach { path, context } => {
                            send_path(&mut session, theme, &path, context.as_deref(), &config)
                                .await;
                        }
                        SpecialCommand::Paste { data_url, context } => {
                            send_pasted(&mut session, theme, &data_url, context.as_deref(), &config)
                                .await;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => send_text(&mut session, theme, &line).await,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn send_text(session: &mut ChatSession, theme: Theme, text: &str) {
        println!("{}", theme.muted("Thinking..."));
        let result = session.send_text(text).await;
        print_outcome(session, theme, result.map(|r| r.unwrap_or_default()));
    }

    async fn send_path(
        session: &mut ChatSession,
        theme: Theme,
        path: &Path,
        context: Option<&str>,
        config: &Config,
    ) {
        let file = match AttachedFile::from_path(path, config.chat.max_file_size_bytes).await {
            Ok(file) => file,
            Err(e) => {
                println!("{}\n", theme.error(&describe(&e)));
                return;
            }
        };
        send_attached(session, theme, &file, context).await;
    }

    async fn send_pasted(
        session: &mut ChatSession,
        theme: Theme,
        data_url: &str,
        context: Option<&str>,
        config: &Config,
    ) {
        let file =
            match AttachedFile::from_data_url("pasted", data_url, config.chat.max_file_size_bytes) {
                Ok(file) => file,
                Err(e) => {
                    println!("{}\n", theme.error(&describe(&e)));
                    return;
                }
            };
        send_attached(session, theme, &file, context).await;
    }

    async fn send_attached(
        session: &mut ChatSession,
        theme: Theme,
        file: &AttachedFile,
        context: Option<&str>,
    ) {
        // Kept alive until the reply arrives, then removed from disk.
        let preview = match ImagePreview::create(file) {
            Ok(preview) => preview,
            Err(e) => {
                tracing::warn!("No preview for {}: {}", file.name, e);
                None
            }
        };

        let details = format!(
            "Attached {} ({}, {} KB)",
            file.name,
            file.mime_type,
            (file.size() as f64 / 1024.0).round() as u64
        );
        println!("{}", theme.muted(&details));
        if let Some(preview) = &preview {
            let line = format!(
                "Preview: {} ({}x{})",
                preview.url(),
                preview.width,
                preview.height
            );
            println!("{}", theme.muted(&line));
        }

        println!("{}", theme.muted("Thinking..."));
        let result = session.send_file(file, context).await;
        print_outcome(session, theme, result);

        if let Some(preview) = preview {
            if let Err(e) = preview.release() {
                tracing::warn!("Failed to remove preview: {}", e);
            }
        }
    }

    fn print_outcome(session: &ChatSession, theme: Theme, result: Result<String>) {
        match result {
            Ok(reply) => {
                println!("\n{}: {}\n", theme.assistant_label(), reply);
            }
            Err(e) => {
                let message = session
                    .last_error()
                    .map(str::to_string)
                    .unwrap_or_else(|| describe(&e));
                println!("\n{}\n", theme.error(&message));
                tracing::debug!("Full error: {:#}", e);
            }
        }
    }

    /// Display welcome banner at the start of interactive chat
    fn print_welcome_banner(config: &Config, theme: Theme) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║               Gemma Chat - Interactive Session               ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Model:    {}", theme.muted(&config.ollama.model));
        println!("Server:   {}", config.ollama.host);
        println!("Endpoint: {}\n", config.ollama.endpoint);
        println!("Type '/help' for available commands, 'exit' to quit");
    }

    /// Display detailed status information about the current session
    fn print_status_display(session: &ChatSession, config: &Config) {
        let caps = session.builder().capabilities();

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Gemma Chat Session Status                ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Model:             {}", session.builder().model());
        println!("Server:            {}", config.ollama.host);
        println!("Endpoint:          {}", caps.kind);
        println!(
            "Inline audio:      {}",
            if caps.inline_audio { "yes" } else { "no (described)" }
        );
        println!(
            "File size limit:   {} MB",
            config.chat.max_file_size_bytes / (1024 * 1024)
        );
        println!("Conversation Size: {} messages", session.messages().len());
        println!("State:             {:?}", session.state());
        if let Some(error) = session.last_error() {
            println!("Last error:        {}", error);
        }
        println!();
    }

}

// One-shot question handler
pub mod ask {
    //! One-shot question handler.

    use super::*;
    use crate::error::GemmaChatError;
    use std::path::PathBuf;

    /// Send a single question (and optional file) and print the reply
    ///
    /// # Errors
    ///
    /// Returns error if there is nothing to send, the file is rejected, or
    /// the request fails
    pub async fn run_ask(
        config: Config,
        prompt: Option<String>,
        file: Option<PathBuf>,
        system: Option<String>,
    ) -> Result<()> {
        let mut session = build_session(&config, system)?;

        let reply = match file {
            Some(path) => {
                tracing::info!("Asking about {}", path.display());
                session.send_path(&path, prompt.as_deref()).await?
            }
            None => {
                let text = prompt.unwrap_or_default();
                session.send_text(&text).await?.ok_or_else(|| {
                    GemmaChatError::Config("Nothing to ask: give a prompt or --file".to_string())
                })?
            }
        };

        println!("{}", reply);
        Ok(())
    }
}
