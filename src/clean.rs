//! Clean stage: merge raw export CSVs and deduplicate by DOI.
//!
//! Merges every CSV under `data/raw/<folder>` (recursively), selecting the
//! DOI / Document title / Abstract columns by case-insensitive guessing,
//! sorts by DOI with empty DOIs last, and writes `merged.csv`, a deduplicated
//! `cleaned.csv`, and a summary `log.txt`.

use crate::dataset::guess_column;
use crate::error::{Result, ScreenError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Output column order for merged and cleaned files
const MERGED_COLUMNS: [&str; 3] = ["DOI", "Document title", "Abstract"];

/// One merged row after column selection
#[derive(Debug, Clone)]
struct MergedRow {
    doi: String,
    title: String,
    abstract_text: String,
}

impl MergedRow {
    fn doi_normalized(&self) -> String {
        self.doi.trim().to_lowercase()
    }
}

/// Counts and file paths reported by the clean stage
#[derive(Debug, Clone)]
pub struct CleanSummary {
    pub initial_count: usize,
    pub null_doi_count: usize,
    pub duplicate_rows_count: usize,
    pub final_count: usize,
    pub missing_title_count: usize,
    pub missing_abstract_count: usize,
    pub duplicate_doi_values: Vec<String>,
    pub merged_path: PathBuf,
    pub cleaned_path: PathBuf,
    pub log_path: PathBuf,
}

/// Merge and deduplicate `data/raw/<folder>` into `data/clean/<folder>/cleaned.csv`.
pub fn clean_folder(folder: &str, data_dir: &Path) -> Result<CleanSummary> {
    let raw_dir = data_dir.join("raw").join(folder);
    let files = find_csv_files(&raw_dir)?;
    if files.is_empty() {
        return Err(ScreenError::Config(format!(
            "No CSV files found under: {}",
            raw_dir.display()
        )));
    }

    let mut merged: Vec<MergedRow> = Vec::new();
    for file in &files {
        match read_and_select(file) {
            Ok(mut rows) => merged.append(&mut rows),
            Err(e) => warn!(file = %file.display(), error = %e, "Skipping unreadable CSV"),
        }
    }
    if merged.is_empty() {
        return Err(ScreenError::Config(
            "No readable CSVs produced any rows".to_string(),
        ));
    }

    // Case-insensitive by DOI, empty DOIs last; stable sort keeps input order
    // for ties.
    merged.sort_by_key(|r| (r.doi.trim().is_empty(), r.doi_normalized()));

    let initial_count = merged.len();
    let null_doi_count = merged.iter().filter(|r| r.doi.trim().is_empty()).count();
    let missing_title_count = merged.iter().filter(|r| r.title.trim().is_empty()).count();
    let missing_abstract_count = merged
        .iter()
        .filter(|r| r.abstract_text.trim().is_empty())
        .count();

    // Duplicates among non-empty DOIs, keep-first
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicate_doi_values: Vec<String> = Vec::new();
    let mut duplicate_rows_count = 0usize;
    let mut cleaned: Vec<&MergedRow> = Vec::new();
    for row in &merged {
        if row.doi.trim().is_empty() {
            continue;
        }
        let normalized = row.doi_normalized();
        if seen.insert(normalized.clone()) {
            cleaned.push(row);
        } else {
            duplicate_rows_count += 1;
            if !duplicate_doi_values.contains(&normalized) {
                duplicate_doi_values.push(normalized);
            }
        }
    }
    let final_count = cleaned.len();

    let merged_path = raw_dir.join("merged.csv");
    let clean_dir = data_dir.join("clean").join(folder);
    std::fs::create_dir_all(&clean_dir)?;
    let cleaned_path = clean_dir.join("cleaned.csv");
    let log_path = clean_dir.join("log.txt");

    write_rows(&merged_path, merged.iter())?;
    write_rows(&cleaned_path, cleaned.iter().copied())?;

    let summary = CleanSummary {
        initial_count,
        null_doi_count,
        duplicate_rows_count,
        final_count,
        missing_title_count,
        missing_abstract_count,
        duplicate_doi_values,
        merged_path,
        cleaned_path,
        log_path,
    };
    write_log(folder, &summary)?;

    info!(
        initial = summary.initial_count,
        cleaned = summary.final_count,
        duplicates = summary.duplicate_rows_count,
        "Clean stage complete"
    );

    Ok(summary)
}

/// All `*.csv` files under `dir`, recursively, in sorted order.
///
/// A `merged.csv` left by a previous run is not input.
fn find_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ScreenError::Config(format!(
            "Folder not found: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    collect_csv_files(dir, &mut files)?;
    files.retain(|p| p.file_name().and_then(|n| n.to_str()) != Some("merged.csv"));
    files.sort();
    Ok(files)
}

fn collect_csv_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_csv_files(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(path);
        }
    }
    Ok(())
}

/// Read one export CSV and project it onto the merged column selection.
///
/// Missing columns become empty fields; exports disagree on naming, so each
/// column is guessed by keyword priority.
fn read_and_select(path: &Path) -> Result<Vec<MergedRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let doi_col = guess_column(&headers, &["doi"]);
    let title_col = guess_column(&headers, &["document title", "title"]);
    let abstract_col = guess_column(&headers, &["abstract", "summary"]);

    let field = |row: &csv::StringRecord, col: Option<usize>| -> String {
        col.and_then(|c| row.get(c)).unwrap_or("").to_string()
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(MergedRow {
            doi: field(&record, doi_col),
            title: field(&record, title_col),
            abstract_text: field(&record, abstract_col),
        });
    }
    Ok(rows)
}

fn write_rows<'a>(path: &Path, rows: impl Iterator<Item = &'a MergedRow>) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(MERGED_COLUMNS)?;
    for row in rows {
        wtr.write_record([&row.doi, &row.title, &row.abstract_text])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_log(folder: &str, summary: &CleanSummary) -> Result<()> {
    let mut lines = vec![
        format!("PROCESSING LOG - {}", folder),
        format!(
            "Timestamp: {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        ),
        String::new(),
        "SUMMARY".to_string(),
        format!("Initial merged rows:            {}", summary.initial_count),
        format!("Null/empty DOIs:               {}", summary.null_doi_count),
        format!(
            "Duplicate rows among non-null DOI: {}",
            summary.duplicate_rows_count
        ),
        format!(
            "Final cleaned rows (deduplicated): {}",
            summary.final_count
        ),
        format!(
            "Rows with missing Document title:  {}",
            summary.missing_title_count
        ),
        format!(
            "Rows with missing Abstract:        {}",
            summary.missing_abstract_count
        ),
        String::new(),
        "DETAILS".to_string(),
        "Duplicate DOI values (occurred >1 time):".to_string(),
    ];

    if summary.duplicate_doi_values.is_empty() {
        lines.push("(none)".to_string());
    } else {
        for (i, doi) in summary.duplicate_doi_values.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, doi));
        }
    }

    lines.push(String::new());
    lines.push(format!("Merged CSV written to: {}", summary.merged_path.display()));
    lines.push(format!(
        "Cleaned CSV written to: {}",
        summary.cleaned_path.display()
    ));
    lines.push(format!("Log file: {}", summary.log_path.display()));
    lines.push(String::new());

    std::fs::write(&summary.log_path, lines.join("\n"))?;
    Ok(())
}
