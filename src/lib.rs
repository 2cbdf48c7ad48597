//! # litscreen
//!
//! Systematic literature review pipeline: merge raw bibliographic exports,
//! deduplicate by DOI, and screen abstracts for topical relevance through
//! the Gemini API.
//!
//! ## Modules
//!
//! - [`clean`] - Merge raw export CSVs and deduplicate by DOI
//! - [`dataset`] - Input CSV loading and column detection
//! - [`batch`] - Batch partitioning of records
//! - [`prompts`] - Screening prompt templates
//! - [`model`] - Gemini client with bounded retry
//! - [`parser`] - Verdict extraction from model output
//! - [`reconcile`] - Verdict reconciliation and fail-open defaults
//! - [`report`] - Included/excluded split and summary log
//! - [`screen`] - Screen stage orchestration
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use litscreen::clean;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let summary = clean::clean_folder("extraction-1", Path::new("data"))?;
//!     println!("{} rows after deduplication", summary.final_count);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod clean;
pub mod dataset;
pub mod error;
pub mod model;
pub mod parser;
pub mod prompts;
pub mod reconcile;
pub mod report;
pub mod screen;

pub use error::{Result, ScreenError};
