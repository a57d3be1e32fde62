//! # Appraisal Harness CLI (`appraise`)
//!
//! ## Usage
//!
//! ```bash
//! appraise --config ./config/appraise.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `appraise audit <file>` | Score a report against the rubric |
//! | `appraise extract <file>` | Show extraction and chunking statistics |
//! | `appraise index <file>` | Build the vector index and optionally query it |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use appraisal_harness::audit_cmd::{run_audit, OutputFormat};
use appraisal_harness::config;
use appraisal_harness::inspect::{run_extract, run_index};
use appraisal_harness::progress::ProgressMode;

/// Appraisal Harness CLI: retrieval-augmented rubric scoring of project
/// appraisal reports.
#[derive(Parser)]
#[command(
    name = "appraise",
    about = "Appraisal Harness: retrieval-augmented rubric scoring of project appraisal reports",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/appraise.toml`. When the file does not exist,
    /// built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/appraise.toml")]
    config: PathBuf,

    /// Progress output on stderr: `auto` (human on a TTY), `human`, `json`, or `off`.
    #[arg(long, global = true, default_value = "auto", value_parser = ProgressMode::parse)]
    progress: ProgressMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a report against the rubric.
    ///
    /// Extracts the text, builds a vector index (falling back to a prefix
    /// of the text if indexing fails), scores both rubric sections, and
    /// prints the report.
    Audit {
        /// Report file (`.pdf`, `.txt`, `.md`).
        file: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show extraction statistics and the resulting chunk count.
    Extract {
        /// Report file (`.pdf`, `.txt`, `.md`).
        file: PathBuf,
    },

    /// Build the vector index and print its statistics.
    Index {
        /// Report file (`.pdf`, `.txt`, `.md`).
        file: PathBuf,

        /// Print the best-matching chunks for this query.
        #[arg(long)]
        query: Option<String>,

        /// Number of chunks to print (default: `retrieval.top_k`).
        #[arg(long)]
        k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Audit {
            file,
            format,
            output,
        } => {
            run_audit(&cfg, &file, format, output.as_deref(), cli.progress).await?;
        }
        Commands::Extract { file } => {
            run_extract(&cfg, &file)?;
        }
        Commands::Index { file, query, k } => {
            run_index(&cfg, &file, query.as_deref(), k, cli.progress).await?;
        }
    }

    Ok(())
}
