//! Screen stage orchestration.
//!
//! Drives the sequential batch loop: build prompt, call the model (with its
//! retry policy), parse, reconcile. A batch-level failure stops further
//! batches but the run always finalizes and reports on the work done so far.

use crate::batch;
use crate::dataset::{Dataset, Record};
use crate::error::{Result, ScreenError};
use crate::model::{ModelClient, ModelConfig};
use crate::parser;
use crate::prompts::screening::build_prompt;
use crate::reconcile::{self, ResultMap};
use crate::report::{self, ScreenSummary};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Default number of papers per model call
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Context file used when neither a file nor a literal is supplied
pub const DEFAULT_CONTEXT_FILE: &str = "screening-context.txt";

/// Options for one screen run
#[derive(Debug, Clone)]
pub struct ScreenOptions {
    /// Extraction folder name under `data/clean/`
    pub folder: String,
    pub batch_size: usize,
    pub context_text: Option<String>,
    pub context_file: Option<PathBuf>,
    /// Output directory; defaults to `data/filtered/<folder>/`
    pub out_dir: Option<PathBuf>,
}

/// Resolve the screening context from exactly one source.
///
/// A literal and a file are mutually exclusive. With neither supplied, the
/// default context file is used when it exists; otherwise the run aborts
/// before any batch is issued.
pub fn resolve_context(
    context_text: Option<&str>,
    context_file: Option<&Path>,
    default_file: &Path,
) -> Result<String> {
    match (context_text, context_file) {
        (Some(_), Some(_)) => Err(ScreenError::Config(
            "Supply either a context file or a context text, not both".to_string(),
        )),
        (Some(text), None) => Ok(text.to_string()),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
            ScreenError::Config(format!("Cannot read context file {}: {}", path.display(), e))
        }),
        (None, None) => {
            if default_file.exists() {
                Ok(std::fs::read_to_string(default_file)?)
            } else {
                Err(ScreenError::Config(format!(
                    "No screening context: provide --context-file or --context-text (default {} not found)",
                    default_file.display()
                )))
            }
        }
    }
}

/// Screen one folder: `data/clean/<folder>/cleaned.csv` into
/// `data/filtered/<folder>/`.
pub async fn screen_folder(
    opts: &ScreenOptions,
    model: &ModelConfig,
    data_dir: &Path,
) -> Result<ScreenSummary> {
    if opts.batch_size == 0 {
        return Err(ScreenError::Config(
            "Batch size must be a positive integer".to_string(),
        ));
    }

    let context = resolve_context(
        opts.context_text.as_deref(),
        opts.context_file.as_deref(),
        Path::new(DEFAULT_CONTEXT_FILE),
    )?;

    let input_csv = data_dir
        .join("clean")
        .join(&opts.folder)
        .join("cleaned.csv");
    let dataset = Dataset::from_csv(&input_csv)?;

    let out_dir = opts
        .out_dir
        .clone()
        .unwrap_or_else(|| data_dir.join("filtered").join(&opts.folder));

    let client = ModelClient::new(model)?;
    run(
        &dataset,
        &context,
        opts.batch_size,
        &client,
        &input_csv.display().to_string(),
        &out_dir,
    )
    .await
}

/// The state machine for one run: per batch BUILD_PROMPT -> CALL_MODEL ->
/// PARSE -> RECONCILE, then FINALIZE and WRITE_REPORT unconditionally.
pub async fn run(
    dataset: &Dataset,
    context: &str,
    batch_size: usize,
    client: &ModelClient,
    input_name: &str,
    out_dir: &Path,
) -> Result<ScreenSummary> {
    let records = dataset.records();
    let total_batches = records.len().div_ceil(batch_size);
    info!(
        papers = records.len(),
        batch_size = batch_size,
        batches = total_batches,
        "Starting screening run"
    );

    let mut map = ResultMap::new();
    for (number, batch) in batch::partition(&records, batch_size).enumerate() {
        let start = batch.first().map(|r| r.index).unwrap_or(0);
        info!(batch = number + 1, total = total_batches, start = start, "Screening batch");

        match screen_batch(client, context, batch).await {
            Ok(entries) => reconcile::apply_entries(&mut map, &entries),
            Err(e) => {
                // Likely systemic (quota gone, model misbehaving): stop
                // issuing batches, keep what was decided so far.
                error!(
                    batch_start = start,
                    error = %e,
                    "Batch failed after retries; stopping remaining batches"
                );
                break;
            }
        }
    }

    reconcile::finalize(&mut map, records.len());
    report::write_reports(dataset, &map, input_name, out_dir)
}

/// One batch through prompt, model, and parser.
async fn screen_batch(
    client: &ModelClient,
    context: &str,
    batch: &[Record],
) -> Result<Vec<Value>> {
    let prompt = build_prompt(context, batch)?;
    let raw = client.generate(&prompt).await?;
    parser::extract_entries(&raw)
}
