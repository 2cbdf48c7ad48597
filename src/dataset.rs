//! Input dataset loading and column detection.
//!
//! Loads the cleaned CSV produced by the clean stage, keeping every original
//! column as passthrough data. The screening core only ever reads the title
//! and abstract columns, which are detected case-insensitively.

use crate::error::{Result, ScreenError};
use std::path::Path;
use tracing::info;

/// One paper under review, as seen by the screening core.
#[derive(Debug, Clone)]
pub struct Record {
    /// 0-based position in the input dataset, stable across batches
    pub index: usize,
    pub title: String,
    pub abstract_text: String,
}

/// The full input dataset: header row plus raw rows with all original columns.
#[derive(Debug)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    title_col: usize,
    abstract_col: usize,
}

impl Dataset {
    /// Load a CSV, detecting the title and abstract columns.
    ///
    /// Rows shorter than the header are padded with empty fields so that
    /// passthrough output keeps a rectangular shape.
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScreenError::Config(format!(
                "Input CSV not found: {}",
                path.display()
            )));
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let title_col = detect_column(&headers, "title").ok_or_else(|| {
            ScreenError::Config(format!(
                "Input CSV must contain a Title column. Found: {}",
                headers.join(", ")
            ))
        })?;
        let abstract_col = detect_column(&headers, "abstract").ok_or_else(|| {
            ScreenError::Config(format!(
                "Input CSV must contain an Abstract column. Found: {}",
                headers.join(", ")
            ))
        })?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        info!(
            rows = rows.len(),
            path = %path.display(),
            title_column = %headers[title_col],
            abstract_column = %headers[abstract_col],
            "Loaded dataset"
        );

        Ok(Self {
            headers,
            rows,
            title_col,
            abstract_col,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Project the dataset onto the fields the screening core reads.
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| Record {
                index,
                title: row[self.title_col].clone(),
                abstract_text: row[self.abstract_col].clone(),
            })
            .collect()
    }
}

/// Detect a column case-insensitively: an exact name match wins over a
/// substring match.
pub(crate) fn detect_column(headers: &[String], name: &str) -> Option<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    lowered
        .iter()
        .position(|h| h == name)
        .or_else(|| lowered.iter().position(|h| h.contains(name)))
}

/// Guess a column by trying each keyword in turn as a substring.
///
/// Keyword order is the priority order; used by the clean stage where source
/// exports name the same field differently ("abstract" vs "summary").
pub(crate) fn guess_column(headers: &[String], keys: &[&str]) -> Option<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    for key in keys {
        if let Some(pos) = lowered.iter().position(|h| h.contains(key)) {
            return Some(pos);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detect_column_prefers_exact_match() {
        let headers = strings(&["Short Title", "Title", "Abstract"]);
        assert_eq!(detect_column(&headers, "title"), Some(1));
    }

    #[test]
    fn test_detect_column_substring_fallback() {
        let headers = strings(&["DOI", "Document Title", "Abstract Note"]);
        assert_eq!(detect_column(&headers, "title"), Some(1));
        assert_eq!(detect_column(&headers, "abstract"), Some(2));
        assert_eq!(detect_column(&headers, "keywords"), None);
    }

    #[test]
    fn test_guess_column_keyword_priority() {
        let headers = strings(&["DOI", "Summary", "Notes"]);
        assert_eq!(guess_column(&headers, &["abstract", "summary"]), Some(1));
        assert_eq!(guess_column(&headers, &["abstract"]), None);
    }

    #[test]
    fn test_from_csv_loads_records() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        writeln!(temp, "DOI,Title,Abstract")?;
        writeln!(temp, "10.1/a,Paper A,About A")?;
        writeln!(temp, "10.1/b,Paper B,")?;
        temp.flush()?;

        let dataset = Dataset::from_csv(temp.path())?;
        assert_eq!(dataset.len(), 2);

        let records = dataset.records();
        assert_eq!(records[0].index, 0);
        assert_eq!(records[0].title, "Paper A");
        assert_eq!(records[1].abstract_text, "");
        Ok(())
    }

    #[test]
    fn test_from_csv_missing_abstract_column() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        writeln!(temp, "DOI,Title")?;
        writeln!(temp, "10.1/a,Paper A")?;
        temp.flush()?;

        let err = Dataset::from_csv(temp.path()).expect_err("should fail");
        assert!(matches!(err, ScreenError::Config(_)));
        assert!(err.to_string().contains("Abstract"));
        Ok(())
    }

    #[test]
    fn test_from_csv_missing_file() {
        let err = Dataset::from_csv(Path::new("/nonexistent/cleaned.csv")).expect_err("should fail");
        assert!(matches!(err, ScreenError::Config(_)));
    }
}
