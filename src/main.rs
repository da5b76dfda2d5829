//! Gemma Chat - terminal chat front-end for a local Ollama model
//!
#![doc = "Gemma Chat - terminal chat front-end for a local Ollama model"]
#![doc = "Main entry point for the gemma-chat binary."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gemma_chat::cli::{Cli, Commands, ModelCommand};
use gemma_chat::commands;
use gemma_chat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { system, theme } => {
            if system.is_some() {
                tracing::debug!("Using system prompt override");
            }
            commands::chat::run_chat(config, system, theme).await?;
            Ok(())
        }
        Commands::Ask {
            prompt,
            file,
            system,
        } => {
            if let Some(path) = &file {
                tracing::debug!("Attaching file: {}", path.display());
            }
            commands::ask::run_ask(config, prompt, file, system).await?;
            Ok(())
        }
        Commands::Models { command } => match command {
            ModelCommand::List { json } => {
                commands::models::list_models(&config, json).await?;
                Ok(())
            }
        },
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins when set; otherwise `-v` selects debug output. Logs go to
/// stderr so replies on stdout stay clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "gemma_chat=debug"
    } else {
        "gemma_chat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
