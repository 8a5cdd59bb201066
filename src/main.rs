//! # StudyFlow CLI (`studyflow`)
//!
//! Command-line front end for the StudyFlow backend. Each command drives one
//! view from the library and prints its resulting state.
//!
//! ## Usage
//!
//! ```bash
//! studyflow --config ./config/studyflow.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `studyflow provider show` | Current and available LLM providers |
//! | `studyflow provider switch <name>` | Switch the answering provider |
//! | `studyflow upload <file>` | Upload a PDF or Word document |
//! | `studyflow docs list` | List uploaded documents |
//! | `studyflow docs delete <id>` | Delete a document |
//! | `studyflow extract <id>` | Run knowledge extraction on a document |
//! | `studyflow map <id>` | Show a document's knowledge map |
//! | `studyflow ask "<question>" --document <id>` | Ask one question |
//! | `studyflow chat --document <id>` | Interactive Q&A from stdin |
//! | `studyflow ocr <image>` | Recognize text in an image |
//! | `studyflow route <path>` | Show which screen a path opens |
//!
//! Logs go to stderr; set `RUST_LOG=studyflow=debug` to see every request.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use studyflow::client::ApiClient;
use studyflow::config::{self, Config};
use studyflow::i18n::Language;
use studyflow::{chat, knowledge_map, library, provider, router, upload};

/// StudyFlow CLI: upload study material, explore its knowledge map, and ask
/// questions about it.
///
/// All commands accept `--config` pointing to a TOML file. When the file
/// does not exist, built-in defaults are used (backend at
/// `http://localhost:8000/api`).
#[derive(Parser)]
#[command(
    name = "studyflow",
    about = "StudyFlow: document Q&A and knowledge maps for study material",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/studyflow.toml")]
    config: PathBuf,

    /// Display language (`cn` or `en`). Overrides `ui.language`.
    #[arg(long, global = true)]
    lang: Option<Language>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or switch the LLM provider.
    Provider {
        #[command(subcommand)]
        action: ProviderAction,
    },

    /// Upload a document (pdf, doc, docx) and print its id.
    Upload {
        /// Path to the file.
        file: PathBuf,
    },

    /// Manage uploaded documents.
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Trigger knowledge extraction for a document.
    Extract {
        document_id: String,

        /// Extraction granularity.
        #[arg(long, default_value = "chapter")]
        level: String,
    },

    /// Show a document's knowledge map.
    Map {
        document_id: String,

        /// Print layout-engine elements, stylesheet and layout as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ask one question about a document.
    Ask {
        question: String,

        /// Document to answer from.
        #[arg(long)]
        document: String,

        /// Attach an image to the question.
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Interactive Q&A: one question per line on stdin.
    Chat {
        #[arg(long)]
        document: String,
    },

    /// Recognize text in an image.
    Ocr { image: PathBuf },

    /// Show which screen a path resolves to.
    Route { path: String },
}

#[derive(Subcommand)]
enum ProviderAction {
    /// List providers and mark the current one.
    Show,
    /// Switch to another provider.
    Switch { name: String },
}

#[derive(Subcommand)]
enum DocsAction {
    /// List documents.
    List {
        /// Only show documents whose name contains this text.
        #[arg(long)]
        search: Option<String>,
    },
    /// Delete a document.
    Delete { id: String },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    // Commands that don't require config
    if let Commands::Route { path } = &cli.command {
        return router::run_route(path);
    }

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::debug!(path = %cli.config.display(), "config not found, using defaults");
        Config::minimal()
    };
    let lang = cli.lang.unwrap_or(cfg.ui.language);
    let client = ApiClient::new(&cfg.api)?;

    match cli.command {
        Commands::Provider { action } => match action {
            ProviderAction::Show => provider::run_show(&client, lang).await?,
            ProviderAction::Switch { name } => provider::run_switch(&client, lang, &name).await?,
        },
        Commands::Upload { file } => {
            upload::run_upload(&client, &cfg.upload, lang, &file).await?;
        }
        Commands::Docs { action } => match action {
            DocsAction::List { search } => {
                library::run_docs_list(&client, &cfg.library, &cfg.upload, lang, search.as_deref())
                    .await?
            }
            DocsAction::Delete { id } => library::run_docs_delete(&client, lang, &id).await?,
        },
        Commands::Extract { document_id, level } => {
            knowledge_map::run_extract(&client, lang, &document_id, &level).await?;
        }
        Commands::Map { document_id, json } => {
            knowledge_map::run_map(&client, lang, &document_id, json).await?;
        }
        Commands::Ask {
            question,
            document,
            image,
        } => {
            chat::run_ask(
                &client,
                &cfg.chat,
                lang,
                &document,
                &question,
                image.as_deref(),
            )
            .await?;
        }
        Commands::Chat { document } => {
            chat::run_chat(&client, &cfg.chat, lang, &document).await?;
        }
        Commands::Ocr { image } => {
            chat::run_ocr(&client, lang, &image).await?;
        }
        Commands::Route { .. } => {}
    }

    Ok(())
}
