//! litscreen - Systematic Literature Review Pipeline
//!
//! A CLI for merging raw bibliographic export CSVs, deduplicating them by DOI,
//! and screening abstracts for topical relevance through the Gemini API.
//!
//! ## Usage
//!
//! ```bash
//! litscreen clean extraction-1
//! litscreen screen extraction-1 --context-file screening-context.txt
//! litscreen run extraction-1 --batch 10
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use litscreen::clean;
use litscreen::model::ModelConfig;
use litscreen::screen::{self, ScreenOptions};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Base data directory holding `raw/`, `clean/`, and `filtered/`
const DATA_DIR: &str = "data";

// ============================================================================
// CLI Definition
// ============================================================================

/// Systematic Literature Review Pipeline - merge, deduplicate, LLM-screen
#[derive(Parser)]
#[command(name = "litscreen")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge raw export CSVs under data/raw/<folder> and deduplicate by DOI
    Clean {
        /// Extraction folder name under data/raw/ (e.g. extraction-1)
        folder: String,
    },

    /// Screen data/clean/<folder>/cleaned.csv through the model
    Screen {
        /// Extraction folder name under data/clean/ (e.g. extraction-1)
        folder: String,

        #[command(flatten)]
        screen_args: ScreenArgs,
    },

    /// Clean then screen in one pass
    Run {
        /// Extraction folder name under data/raw/ (e.g. extraction-1)
        folder: String,

        #[command(flatten)]
        screen_args: ScreenArgs,
    },
}

#[derive(Args)]
struct ScreenArgs {
    /// Papers per model call
    #[arg(long, default_value_t = screen::DEFAULT_BATCH_SIZE)]
    batch: usize,

    /// Screening criteria file (default: screening-context.txt when present)
    #[arg(long)]
    context_file: Option<PathBuf>,

    /// Screening criteria as a literal string
    #[arg(long, conflicts_with = "context_file")]
    context_text: Option<String>,

    /// Gemini model name (falls back to GEMINI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Gemini API key (falls back to GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Override the model API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Output directory (default: data/filtered/<folder>/)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Clean { folder } => run_clean(&folder),
        Commands::Screen {
            folder,
            screen_args,
        } => run_screen(&folder, screen_args).await,
        Commands::Run {
            folder,
            screen_args,
        } => {
            run_clean(&folder)?;
            run_screen(&folder, screen_args).await
        }
    }
}

fn run_clean(folder: &str) -> Result<()> {
    let summary =
        clean::clean_folder(folder, Path::new(DATA_DIR)).context("Clean stage failed")?;

    println!(
        "Merged {} rows ({} empty DOI, {} duplicates), wrote {} cleaned rows.",
        summary.initial_count,
        summary.null_doi_count,
        summary.duplicate_rows_count,
        summary.final_count
    );
    println!("Cleaned CSV: {}", summary.cleaned_path.display());
    Ok(())
}

async fn run_screen(folder: &str, args: ScreenArgs) -> Result<()> {
    let model_config = model_config_from(&args)?;

    let opts = ScreenOptions {
        folder: folder.to_string(),
        batch_size: args.batch,
        context_text: args.context_text,
        context_file: args.context_file,
        out_dir: args.out,
    };

    let summary = screen::screen_folder(&opts, &model_config, Path::new(DATA_DIR))
        .await
        .context("Screen stage failed")?;

    println!(
        "Wrote {} included and {} excluded rows (of {}).",
        summary.included, summary.excluded, summary.total
    );
    for (reason, count) in &summary.reason_counts {
        println!("  excluded {}: {}", reason, count);
    }
    Ok(())
}

/// Build the model configuration from flags with environment fallbacks.
fn model_config_from(args: &ScreenArgs) -> Result<ModelConfig> {
    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()))
        .context("Missing API key: pass --api-key or set GEMINI_API_KEY")?;

    let model = args
        .model
        .clone()
        .or_else(|| std::env::var("GEMINI_MODEL").ok().filter(|s| !s.is_empty()))
        .context("Missing model name: pass --model or set GEMINI_MODEL")?;

    Ok(ModelConfig::new(api_key, model, args.base_url.clone()))
}
