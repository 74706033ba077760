use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::time::Duration;

use super::{Config, OllamaConfig, RetrievalConfig, get_config_dir};
use crate::engine::context::StrategyKind;
use crate::ollama::OllamaClient;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 aigist Configuration Setup").bold().cyan());
    eprintln!();

    let config_dir = get_config_dir().context("Failed to locate configuration directory")?;
    let mut config = Config::load(&config_dir).context("Failed to load existing configuration")?;

    eprintln!("{}", style("Ollama Configuration").bold().yellow());
    eprintln!("Configure your local Ollama instance for embeddings and answer generation.");
    eprintln!();

    configure_ollama(&mut config.ollama)?;

    eprintln!();
    eprintln!("{}", style("Retrieval Configuration").bold().yellow());
    configure_retrieval(&mut config.retrieval)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config.ollama) {
        eprintln!("{}", style("✓ Ollama connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Ollama").yellow()
        );
        eprintln!("You can continue, but make sure Ollama is running before adding documents.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir().context("Failed to locate configuration directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    eprintln!("  Host: {}", style(&config.ollama.host).cyan());
    eprintln!("  Port: {}", style(config.ollama.port).cyan());
    eprintln!(
        "  Generation Model: {}",
        style(&config.ollama.generation_model).cyan()
    );
    eprintln!(
        "  Embedding Model: {}",
        style(&config.ollama.embedding_model).cyan()
    );
    eprintln!(
        "  Timeout: {}s",
        style(config.ollama.timeout_seconds).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!(
        "  Retention Cap: {} documents per user",
        style(config.retrieval.retention_cap).cyan()
    );
    eprintln!(
        "  Context Strategy: {}",
        style(config.retrieval.strategy).cyan()
    );
    eprintln!(
        "  Keyword Top-K: {}",
        style(config.retrieval.keyword_top_k).cyan()
    );
    eprintln!(
        "  Chunk Size / Overlap: {} / {}",
        style(config.chunking.chunk_size).cyan(),
        style(config.chunking.overlap).cyan()
    );

    eprintln!();
    match config.ollama.ollama_url() {
        Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );
    eprintln!(
        "Vector store: {}",
        style(config.store_path().display()).dim()
    );

    Ok(())
}

fn configure_ollama(config: &mut OllamaConfig) -> Result<()> {
    let protocols = ["http", "https"];
    let default_protocol = usize::from(config.protocol == "https");
    let protocol_idx = Select::new()
        .with_prompt("Protocol")
        .items(&protocols)
        .default(default_protocol)
        .interact()?;
    config.set_protocol(protocols[protocol_idx].to_string())?;

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(config.host.clone())
        .interact_text()?;
    config.set_host(host)?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(config.port)
        .interact_text()?;
    config.set_port(port)?;

    let generation_model: String = Input::new()
        .with_prompt("Generation model")
        .default(config.generation_model.clone())
        .interact_text()?;
    config.set_generation_model(generation_model)?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(config.embedding_model.clone())
        .interact_text()?;
    config.set_embedding_model(embedding_model)?;

    let timeout: u64 = Input::new()
        .with_prompt("Request timeout (seconds)")
        .default(config.timeout_seconds)
        .interact_text()?;
    config.set_timeout_seconds(timeout)?;

    Ok(())
}

fn configure_retrieval(config: &mut RetrievalConfig) -> Result<()> {
    let cap: usize = Input::new()
        .with_prompt("Documents retained per user")
        .default(config.retention_cap)
        .interact_text()?;
    config.set_retention_cap(cap)?;

    let strategies = ["full", "keyword"];
    let default_strategy = usize::from(config.strategy == StrategyKind::Keyword);
    let strategy_idx = Select::new()
        .with_prompt("Context strategy")
        .items(&strategies)
        .default(default_strategy)
        .interact()?;
    config.strategy = strategies[strategy_idx]
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    Ok(())
}

fn test_ollama_connection(config: &OllamaConfig) -> bool {
    let client = match OllamaClient::new(config) {
        Ok(client) => client.with_timeout(Duration::from_secs(5)),
        Err(_) => return false,
    };

    client.ping().is_ok()
}
