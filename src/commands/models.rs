//! Model listing command for Gemma Chat
//!
//! Lists the models installed on the configured Ollama server, as a table
//! or as JSON.

use crate::config::Config;
use crate::error::{GemmaChatError, Result};
use crate::providers::{self, ModelInfo};
use prettytable::{row, Table};

/// List models available on the configured server
///
/// # Arguments
///
/// * `config` - Configuration containing the Ollama host and model
/// * `json` - Print JSON instead of a table
///
/// # Errors
///
/// Returns error if the server is unreachable or the reply is malformed
///
/// # Examples
///
/// ```no_run
/// use gemma_chat::config::Config;
/// use gemma_chat::commands::models::list_models;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load("config/config.yaml", &Default::default())?;
/// list_models(&config, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn list_models(config: &Config, json: bool) -> Result<()> {
    tracing::info!("Listing models from {}", config.ollama.host);

    let client = providers::create_client(&config.ollama)?;
    let models = client.list_models().await?;

    if json {
        output_models_json(&models)?;
        return Ok(());
    }

    if models.is_empty() {
        println!("No models installed on {}", config.ollama.host);
        println!("Pull one with: ollama pull {}", config.ollama.model);
        return Ok(());
    }

    println!("\nAvailable models on {}:\n", config.ollama.host);
    build_models_table(&models, &config.ollama.model).printstd();
    if !models.iter().any(|m| m.name == config.ollama.model) {
        println!(
            "\nConfigured model '{}' is not installed. Pull it with: ollama pull {}",
            config.ollama.model, config.ollama.model
        );
    }
    println!();

    Ok(())
}

/// Output models in JSON format
///
/// # Errors
///
/// Returns `GemmaChatError::Serialization` if serialization fails
fn output_models_json(models: &[ModelInfo]) -> Result<()> {
    let json = serde_json::to_string_pretty(models).map_err(GemmaChatError::Serialization)?;
    println!("{}", json);
    Ok(())
}

/// Build the model table; the configured model is marked with `*`
fn build_models_table(models: &[ModelInfo], active_model: &str) -> Table {
    let mut table = Table::new();
    table.add_row(row!["", "Model Name", "Size", "Modified"]);

    for model in models {
        let marker = if model.name == active_model { "*" } else { "" };
        table.add_row(row![
            marker,
            model.name,
            model.display_size(),
            model.modified_at
        ]);
    }

    table
}
