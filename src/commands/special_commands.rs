//! Special commands parser for interactive chat mode
//!
//! This module parses the slash commands that can be entered during an
//! interactive chat session. Special commands let the user:
//! - Attach a file from disk or paste a data URL
//! - View or change the system prompt
//! - Pick one of the example prompts
//! - Clear the conversation or view the session status
//! - Exit the session
//!
//! Command names are case-insensitive; their arguments are kept as typed.

use std::path::PathBuf;
use thiserror::Error;

/// Suggested prompts shown when the conversation is empty
pub const EXAMPLE_PROMPTS: [&str; 4] = [
    "Explain quantum computing",
    "Write a short poem about AI",
    "Summarize the current AI landscape",
    "Tell me a fun fact",
];

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands change the session or print information instead of being
/// sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Display help information
    Help,

    /// Print the current system prompt
    ShowSystemPrompt,

    /// Replace the system prompt for later messages
    SetSystemPrompt(String),

    /// Attach a file from disk, with optional text sent alongside it
    Attach {
        path: PathBuf,
        context: Option<String>,
    },

    /// Attach a pasted `data:<mime>;base64,...` URL
    Paste {
        data_url: String,
        context: Option<String>,
    },

    /// Drop every message of the conversation
    Clear,

    /// List the example prompts
    Examples,

    /// Send one of the example prompts (zero-based index)
    Example(usize),

    /// Display model, endpoint and conversation status
    ShowStatus,

    /// Forget the error left by the last failed request
    DismissError,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the model as a regular message.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for an unrecognised `/` command,
/// `MissingArgument` when a required argument is absent and
/// `UnsupportedArgument` when an argument is out of range.
///
/// # Examples
///
/// ```
/// use gemma_chat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/system Be brief.").unwrap();
/// assert_eq!(cmd, SpecialCommand::SetSystemPrompt("Be brief.".to_string()));
///
/// let cmd = parse_special_command("hello there").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match name.as_str() {
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/dismiss" => Ok(SpecialCommand::DismissError),
        "/clear" => Ok(SpecialCommand::Clear),
        "/examples" => Ok(SpecialCommand::Examples),

        "/system" if rest.is_empty() => Ok(SpecialCommand::ShowSystemPrompt),
        "/system" => Ok(SpecialCommand::SetSystemPrompt(rest.to_string())),

        "/attach" => {
            let (path, context) = split_path_argument(rest).ok_or_else(|| {
                CommandError::MissingArgument {
                    command: "/attach".to_string(),
                    usage: "/attach <path> [context]".to_string(),
                }
            })?;
            Ok(SpecialCommand::Attach {
                path: PathBuf::from(path),
                context,
            })
        }

        "/paste" => {
            let (data_url, context) = split_path_argument(rest).ok_or_else(|| {
                CommandError::MissingArgument {
                    command: "/paste".to_string(),
                    usage: "/paste <data-url> [context]".to_string(),
                }
            })?;
            if !data_url.starts_with("data:") {
                return Err(CommandError::UnsupportedArgument {
                    command: "/paste".to_string(),
                    arg: data_url,
                });
            }
            Ok(SpecialCommand::Paste { data_url, context })
        }

        "/example" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "/example".to_string(),
                    usage: format!("/example <1-{}>", EXAMPLE_PROMPTS.len()),
                });
            }
            match rest.parse::<usize>() {
                Ok(n) if (1..=EXAMPLE_PROMPTS.len()).contains(&n) => {
                    Ok(SpecialCommand::Example(n - 1))
                }
                _ => Err(CommandError::UnsupportedArgument {
                    command: "/example".to_string(),
                    arg: rest.to_string(),
                }),
            }
        }

        "exit" | "quit" | "/exit" | "/quit" if rest.is_empty() => Ok(SpecialCommand::Exit),

        _ => Err(CommandError::UnknownCommand(name)),
    }
}

/// Split `<first> [rest]`, honouring double quotes around the first token
fn split_path_argument(input: &str) -> Option<(String, Option<String>)> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let (first, rest) = if let Some(quoted) = input.strip_prefix('"') {
        let end = quoted.find('"')?;
        (&quoted[..end], &quoted[end + 1..])
    } else {
        match input.split_once(char::is_whitespace) {
            Some((first, rest)) => (first, rest),
            None => (input, ""),
        }
    };

    if first.is_empty() {
        return None;
    }

    let rest = rest.trim();
    let context = if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    };
    Some((first.to_string(), context))
}

/// Display help text for special commands
///
/// # Examples
///
/// ```
/// use gemma_chat::commands::special_commands::print_help;
///
/// print_help();
/// ```
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

ATTACHMENTS:
  /attach <path> [context]     - Send a file, optionally with a question about it
  /attach "my file.pdf" [ctx]  - Quote paths that contain spaces
  /paste <data-url> [context]  - Send a pasted data:<mime>;base64,... URL

SYSTEM PROMPT:
  /system          - Show the current system prompt
  /system <text>   - Replace the system prompt for later messages

EXAMPLES:
  /examples        - List example prompts
  /example <n>     - Send example prompt number n

SESSION:
  /status          - Show model, endpoint and conversation status
  /dismiss         - Forget the last request error
  /clear           - Clear the conversation
  /help            - Show this help message
  /?               - Same as /help
  exit             - Exit interactive mode
  quit             - Same as exit

NOTES:
  - Command names are case-insensitive
  - Regular text (not starting with /) is sent to the model
  - Files larger than the configured limit (10 MB by default) are rejected
  - Images and audio are sent inline, PDFs and text files as extracted text
"#
    );
}

/// Print the numbered example prompts
pub fn print_examples() {
    println!("\nTry one of these:");
    for (idx, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
        println!("  {}. {}", idx + 1, prompt);
    }
    println!("\nUse '/example <n>' to send one.\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_parse_status_and_clear() {
        assert_eq!(
            parse_special_command("/status").unwrap(),
            SpecialCommand::ShowStatus
        );
        assert_eq!(parse_special_command("/clear").unwrap(), SpecialCommand::Clear);
    }

    #[test]
    fn test_parse_dismiss() {
        assert_eq!(
            parse_special_command("/dismiss").unwrap(),
            SpecialCommand::DismissError
        );
        assert_eq!(
            parse_special_command("/DISMISS").unwrap(),
            SpecialCommand::DismissError
        );
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "quit", "/exit", "/quit", "EXIT", "  quit  "] {
            assert_eq!(
                parse_special_command(input).unwrap(),
                SpecialCommand::Exit,
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_parse_exit_with_trailing_text_is_a_message() {
        assert_eq!(
            parse_special_command("exit strategies for startups").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_parse_case_insensitive_name_preserves_argument_case() {
        assert_eq!(
            parse_special_command("/SYSTEM Answer In CAPS").unwrap(),
            SpecialCommand::SetSystemPrompt("Answer In CAPS".to_string())
        );
    }

    #[test]
    fn test_parse_system_without_argument_shows_prompt() {
        assert_eq!(
            parse_special_command("/system").unwrap(),
            SpecialCommand::ShowSystemPrompt
        );
        assert_eq!(
            parse_special_command("/system   ").unwrap(),
            SpecialCommand::ShowSystemPrompt
        );
    }

    #[test]
    fn test_parse_attach_path_only() {
        assert_eq!(
            parse_special_command("/attach ./Photos/Cat.PNG").unwrap(),
            SpecialCommand::Attach {
                path: PathBuf::from("./Photos/Cat.PNG"),
                context: None,
            }
        );
    }

    #[test]
    fn test_parse_attach_with_context() {
        assert_eq!(
            parse_special_command("/attach report.pdf What are the key findings?").unwrap(),
            SpecialCommand::Attach {
                path: PathBuf::from("report.pdf"),
                context: Some("What are the key findings?".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_attach_quoted_path() {
        assert_eq!(
            parse_special_command(r#"/attach "my notes.txt" summarize"#).unwrap(),
            SpecialCommand::Attach {
                path: PathBuf::from("my notes.txt"),
                context: Some("summarize".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_attach_missing_path() {
        assert!(matches!(
            parse_special_command("/attach"),
            Err(CommandError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse_special_command(r#"/attach "unterminated"#),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_paste() {
        assert_eq!(
            parse_special_command("/paste data:image/png;base64,aGVsbG8= what is it").unwrap(),
            SpecialCommand::Paste {
                data_url: "data:image/png;base64,aGVsbG8=".to_string(),
                context: Some("what is it".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_paste_rejects_non_data_url() {
        assert!(matches!(
            parse_special_command("/paste https://example.com/cat.png"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
    }

    #[test]
    fn test_parse_examples() {
        assert_eq!(
            parse_special_command("/examples").unwrap(),
            SpecialCommand::Examples
        );
        assert_eq!(
            parse_special_command("/example 1").unwrap(),
            SpecialCommand::Example(0)
        );
        assert_eq!(
            parse_special_command("/example 4").unwrap(),
            SpecialCommand::Example(3)
        );
    }

    #[test]
    fn test_parse_example_out_of_range() {
        for input in ["/example 0", "/example 5", "/example two"] {
            assert!(
                matches!(
                    parse_special_command(input),
                    Err(CommandError::UnsupportedArgument { .. })
                ),
                "input: {}",
                input
            );
        }
        assert!(matches!(
            parse_special_command("/example"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_regular_text_returns_none() {
        assert_eq!(
            parse_special_command("Explain quantum computing").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(parse_special_command("").unwrap(), SpecialCommand::None);
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_special_command("/frobnicate now").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/frobnicate".to_string()));
        assert!(err.to_string().contains("/help"));
    }
}
