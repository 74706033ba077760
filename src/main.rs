use aigist::Result;
use aigist::commands::{
    DEFAULT_USER, add_document, ask_question, clear_documents, delete_document, list_documents,
    show_status,
};
use aigist::config::{run_interactive_config, show_config};
use aigist::engine::StrategyKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aigist")]
#[command(about = "Retrieval-augmented Q&A over your own documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Add a text document to the knowledge base ("-" reads stdin)
    Add {
        /// Path to a UTF-8 text file, or "-" for stdin
        path: PathBuf,
        /// Title for the document (defaults to the file name)
        #[arg(long)]
        title: Option<String>,
        /// User the document belongs to
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
    },
    /// Ask a question answered from the stored documents
    Ask {
        /// The question to answer
        question: String,
        /// User whose documents are consulted
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
        /// Context strategy: "full" or "keyword" (defaults to config)
        #[arg(long)]
        strategy: Option<StrategyKind>,
    },
    /// List stored documents
    List {
        /// User whose documents are listed
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
    },
    /// Delete a stored document by id
    Delete {
        /// Document id to delete
        doc_id: String,
        /// User the document must belong to
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show engine status
    Status {
        /// User the status is scoped to
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
    },
    /// Remove all stored documents and vectors
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Add { path, title, user } => {
            add_document(&path, title, &user)?;
        }
        Commands::Ask {
            question,
            user,
            strategy,
        } => {
            ask_question(&question, &user, strategy)?;
        }
        Commands::List { user } => {
            list_documents(&user)?;
        }
        Commands::Delete { doc_id, user, yes } => {
            delete_document(&doc_id, &user, yes)?;
        }
        Commands::Status { user } => {
            show_status(&user)?;
        }
        Commands::Clear { yes } => {
            clear_documents(yes)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["aigist", "list"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::List { .. });
        }
    }

    #[test]
    fn add_command_with_path() {
        let cli = Cli::try_parse_from(["aigist", "add", "notes.txt"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Add { path, title, user } = parsed.command {
                assert_eq!(path, PathBuf::from("notes.txt"));
                assert_eq!(title, None);
                assert_eq!(user, DEFAULT_USER);
            }
        }
    }

    #[test]
    fn add_command_with_title_and_user() {
        let cli = Cli::try_parse_from([
            "aigist",
            "add",
            "notes.txt",
            "--title",
            "My Notes",
            "--user",
            "alice",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Add { title, user, .. } = parsed.command {
                assert_eq!(title, Some("My Notes".to_string()));
                assert_eq!(user, "alice");
            }
        }
    }

    #[test]
    fn ask_command_with_strategy() {
        let cli = Cli::try_parse_from([
            "aigist",
            "ask",
            "What is this about?",
            "--strategy",
            "keyword",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask {
                question, strategy, ..
            } = parsed.command
            {
                assert_eq!(question, "What is this about?");
                assert_eq!(strategy, Some(StrategyKind::Keyword));
            }
        }
    }

    #[test]
    fn ask_command_rejects_bad_strategy() {
        let cli = Cli::try_parse_from(["aigist", "ask", "question", "--strategy", "cosine"]);
        assert!(cli.is_err());
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["aigist", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["aigist", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["aigist", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
