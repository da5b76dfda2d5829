//! Colour themes for terminal output
//!
//! One enumerated option replaces the per-variant colour palettes: the
//! chat loop asks the active theme how to paint speaker labels, errors and
//! the input prompt.

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Colour theme for the chat front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// White-on-black palette with green accents
    #[default]
    Midnight,
    /// Purple and blue accents
    Violet,
    /// No colours at all
    Plain,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Midnight => write!(f, "midnight"),
            Self::Violet => write!(f, "violet"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

impl Theme {
    /// Parse a theme from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use gemma_chat::theme::Theme;
    ///
    /// assert_eq!(Theme::parse_str("Violet").unwrap(), Theme::Violet);
    /// assert!(Theme::parse_str("sepia").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "midnight" | "dark" => Ok(Self::Midnight),
            "violet" | "purple" => Ok(Self::Violet),
            "plain" | "none" | "mono" => Ok(Self::Plain),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }

    /// Label printed before user messages
    pub fn user_label(&self) -> ColoredString {
        match self {
            Self::Midnight => "You".white().bold(),
            Self::Violet => "You".blue().bold(),
            Self::Plain => "You".normal(),
        }
    }

    /// Label printed before assistant replies
    pub fn assistant_label(&self) -> ColoredString {
        match self {
            Self::Midnight => "Assistant".green().bold(),
            Self::Violet => "Assistant".purple().bold(),
            Self::Plain => "Assistant".normal(),
        }
    }

    /// Paint an inline error line
    pub fn error(&self, text: &str) -> ColoredString {
        match self {
            Self::Plain => text.normal(),
            _ => text.red(),
        }
    }

    /// Paint secondary information (status, hints)
    pub fn muted(&self, text: &str) -> ColoredString {
        match self {
            Self::Midnight => text.bright_black(),
            Self::Violet => text.cyan(),
            Self::Plain => text.normal(),
        }
    }

    /// Input prompt, e.g. "[gemma3:4b] >> "
    pub fn format_prompt(&self, model: &str) -> String {
        match self {
            Self::Midnight => format!("[{}] >> ", model.white()),
            Self::Violet => format!("[{}] >> ", model.purple()),
            Self::Plain => format!("[{}] >> ", model),
        }
    }
}
