use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::GistError;
use crate::config::{Config, get_config_dir};
use crate::embeddings::EmbeddingClient;
use crate::engine::{RetrievalEngine, StrategyKind};
use crate::ollama::OllamaClient;
use crate::store::VectorStore;

/// User id used when no `--user` is given; single-user local deployments
/// never need another one.
pub const DEFAULT_USER: &str = "local_user";

fn load_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to locate configuration directory")?;
    Config::load(config_dir)
}

fn build_engine(config: &Config) -> Result<RetrievalEngine> {
    let client = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;
    let store = Arc::new(RwLock::new(VectorStore::open(config.store_path())));

    Ok(RetrievalEngine::new(
        EmbeddingClient::new(Box::new(client.clone())),
        Box::new(client),
        store,
        config.chunking.clone(),
        &config.retrieval,
    ))
}

/// Ingest a text document from a file, or from stdin when `path` is "-"
#[inline]
pub fn add_document(path: &Path, title: Option<String>, user_id: &str) -> Result<()> {
    let (text, default_title) = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read document text from stdin")?;
        (buffer, "Text Entry".to_string())
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document file: {}", path.display()))?;
        let name = path
            .file_name()
            .map_or_else(|| "Document".to_string(), |n| n.to_string_lossy().into_owned());
        (text, name)
    };

    let title = title.unwrap_or(default_title);
    info!("Adding document '{}' for user {}", title, user_id);

    let config = load_config()?;
    let engine = build_engine(&config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("valid progress template"),
    );
    spinner.set_message(format!("Chunking and embedding '{title}'..."));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = engine.add_document(&text, &title, user_id);
    spinner.finish_and_clear();

    let doc_id = result?;
    let status = engine.status(user_id);

    println!(
        "{} Added '{}' ({})",
        style("✓").green(),
        style(&title).bold(),
        doc_id
    );
    println!(
        "  {} documents, {} chunks stored for user {}",
        status.documents_count, status.chunks_count, user_id
    );

    Ok(())
}

/// Answer a question from the user's stored documents
#[inline]
pub fn ask_question(question: &str, user_id: &str, strategy: Option<StrategyKind>) -> Result<()> {
    let config = load_config()?;
    let engine = build_engine(&config)?;

    let kind = strategy.unwrap_or(config.retrieval.strategy);
    let strategy = kind.strategy(config.retrieval.keyword_top_k);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("valid progress template"),
    );
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = engine.answer(question, user_id, strategy.as_ref());
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            println!("{answer}");
            Ok(())
        }
        // Missing material is reported, not treated as a process failure
        Err(GistError::NotFound(message)) => {
            println!("{}", style(message).yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// List the user's stored documents, newest first
#[inline]
pub fn list_documents(user_id: &str) -> Result<()> {
    let config = load_config()?;
    let engine = build_engine(&config)?;

    let summaries = engine.list_documents(user_id);

    if summaries.is_empty() {
        println!("No documents stored for user {user_id}.");
        println!("Use 'aigist add <file>' to add one.");
        return Ok(());
    }

    println!("Documents for {} ({} total):", user_id, summaries.len());
    println!();

    for summary in &summaries {
        println!("📄 {} ({})", style(&summary.title).bold(), summary.doc_id);
        println!("   Chunks: {}", summary.chunk_count);
        println!(
            "   Uploaded: {}",
            summary.upload_time.format("%Y-%m-%d %H:%M:%S")
        );
        println!();
    }

    Ok(())
}

/// Delete one of the user's documents by id
#[inline]
pub fn delete_document(doc_id: &str, user_id: &str, skip_confirm: bool) -> Result<()> {
    let doc_id: Uuid = doc_id
        .parse()
        .with_context(|| format!("Invalid document id: {doc_id}"))?;

    if !skip_confirm {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete document {doc_id} and all its chunks?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let config = load_config()?;
    let engine = build_engine(&config)?;

    match engine.delete_document(doc_id, user_id) {
        Ok(removed) => {
            println!(
                "{} Deleted document {} ({} chunks removed)",
                style("✓").green(),
                doc_id,
                removed
            );
            Ok(())
        }
        Err(GistError::NotFound(message)) => {
            println!("{}", style(message).yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Show engine status for a user
#[inline]
pub fn show_status(user_id: &str) -> Result<()> {
    let config = load_config()?;
    let engine = build_engine(&config)?;

    let status = engine.status(user_id);

    println!("{}", style("Q&A Engine Status").bold().cyan());
    println!("  User: {}", status.user_id);
    println!("  Documents: {}", status.documents_count);
    println!("  Chunks: {}", status.chunks_count);
    println!(
        "  Ready for questions: {}",
        if status.ready_for_questions {
            style("yes").green()
        } else {
            style("no").yellow()
        }
    );
    match status.embedding_dimension {
        Some(dimension) => println!("  Embedding dimension: {dimension}"),
        None => println!("  Embedding dimension: unset (no vectors stored)"),
    }
    println!(
        "  Memory usage: ~{:.1} KiB",
        status.memory_bytes as f64 / 1024.0
    );
    println!(
        "  Store file: {}",
        style(config.store_path().display()).dim()
    );

    Ok(())
}

/// Remove every stored document for every user
#[inline]
pub fn clear_documents(skip_confirm: bool) -> Result<()> {
    if !skip_confirm {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Remove ALL stored documents and vectors?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let config = load_config()?;
    let engine = build_engine(&config)?;

    engine.clear().context("Failed to clear the store")?;
    println!("{} All documents cleared", style("✓").green());

    Ok(())
}
