//! # docqa CLI
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa init` | Create the SQLite index and schema |
//! | `docqa ingest [DIR]` | Ingest every document in DIR (default: `ingest.upload_dir`) |
//! | `docqa ask "<question>"` | Answer one question from the indexed documents |
//! | `docqa status` | Show indexed documents and chunk counts |
//! | `docqa interactive` | Ingest the upload directory, then answer questions from stdin |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docqa::commands;
use docqa::config;

/// Answer questions from a private document set, or refuse.
#[derive(Parser)]
#[command(name = "docqa", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the SQLite index and schema. Safe to run repeatedly.
    Init,

    /// Read, chunk, embed and store every document in a directory.
    ///
    /// Files that cannot be read are reported and skipped; the rest are
    /// still ingested.
    Ingest {
        /// Directory to ingest. Defaults to `ingest.upload_dir`.
        dir: Option<PathBuf>,
    },

    /// Answer a question from the indexed documents.
    Ask {
        question: String,

        /// Print `{"answer": ..., "sources": [...]}` instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show the number of indexed chunks per document.
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Ingest the upload directory, then answer questions read from stdin.
    Interactive,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => commands::run_init(&cfg).await?,
        Commands::Ingest { dir } => commands::run_ingest(&cfg, dir.as_deref()).await?,
        Commands::Ask { question, json } => commands::run_ask(&cfg, &question, json).await?,
        Commands::Status { json } => commands::run_status(&cfg, json).await?,
        Commands::Interactive => commands::run_interactive(&cfg).await?,
    }

    Ok(())
}
