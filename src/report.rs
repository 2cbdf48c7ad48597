//! Report writing for the screen stage.
//!
//! Emits the included/excluded CSV split and a human-readable summary log.
//! Original columns pass through untouched; excluded rows gain a REASON
//! column. No retries here; any I/O failure is fatal.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::reconcile::{Decision, ResultMap, Verdict};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Bucket label for excluded rows with an empty or missing reason
pub const UNKNOWN_REASON: &str = "UNKNOWN";

/// Counts reported at the end of a screen run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSummary {
    pub total: usize,
    pub included: usize,
    pub excluded: usize,
    pub reason_counts: BTreeMap<String, usize>,
}

/// Write `included.csv`, `excluded.csv`, and `log.txt` into `out_dir`.
///
/// Expects a finalized result map (every record index present); a missing
/// index is treated as the fail-open include default.
pub fn write_reports(
    dataset: &Dataset,
    map: &ResultMap,
    input_name: &str,
    out_dir: &Path,
) -> Result<ScreenSummary> {
    std::fs::create_dir_all(out_dir)?;

    let included_path = out_dir.join("included.csv");
    let excluded_path = out_dir.join("excluded.csv");

    let mut included_wtr = csv::Writer::from_path(&included_path)?;
    included_wtr.write_record(dataset.headers())?;

    let mut excluded_headers: Vec<String> = dataset.headers().to_vec();
    excluded_headers.push("REASON".to_string());
    let mut excluded_wtr = csv::Writer::from_path(&excluded_path)?;
    excluded_wtr.write_record(&excluded_headers)?;

    let mut included = 0usize;
    let mut excluded = 0usize;
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();

    for (index, row) in dataset.rows().iter().enumerate() {
        let verdict = map.get(&index).cloned().unwrap_or_else(Verdict::include);
        match verdict.decision {
            Decision::Include => {
                included_wtr.write_record(row)?;
                included += 1;
            }
            Decision::Exclude => {
                let mut out = row.clone();
                out.push(verdict.reason.clone());
                excluded_wtr.write_record(&out)?;
                excluded += 1;

                let bucket = if verdict.reason.trim().is_empty() {
                    UNKNOWN_REASON.to_string()
                } else {
                    verdict.reason
                };
                *reason_counts.entry(bucket).or_insert(0) += 1;
            }
        }
    }

    included_wtr.flush()?;
    excluded_wtr.flush()?;

    let summary = ScreenSummary {
        total: dataset.len(),
        included,
        excluded,
        reason_counts,
    };

    write_log(&summary, input_name, out_dir)?;

    info!(
        included = summary.included,
        excluded = summary.excluded,
        out_dir = %out_dir.display(),
        "Wrote screening reports"
    );

    Ok(summary)
}

fn write_log(summary: &ScreenSummary, input_name: &str, out_dir: &Path) -> Result<()> {
    let mut lines = vec![
        format!("Processing log for input: {}", input_name),
        format!("Timestamp: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")),
        String::new(),
        format!("Total rows processed: {}", summary.total),
        format!("Included: {}", summary.included),
        format!("Excluded: {}", summary.excluded),
        String::new(),
        "Excluded counts by reason:".to_string(),
    ];
    for (reason, count) in &summary.reason_counts {
        lines.push(format!("- {}: {}", reason, count));
    }
    lines.push(String::new());

    std::fs::write(out_dir.join("log.txt"), lines.join("\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{apply_entries, finalize};
    use serde_json::json;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn three_record_dataset() -> Result<(NamedTempFile, Dataset)> {
        let mut temp = NamedTempFile::new()?;
        writeln!(temp, "DOI,Title,Abstract")?;
        writeln!(temp, "10.1/a,Paper A,Alpha")?;
        writeln!(temp, "10.1/b,Paper B,Beta")?;
        writeln!(temp, "10.1/c,Paper C,Gamma")?;
        temp.flush()?;
        let dataset = Dataset::from_csv(temp.path())?;
        Ok((temp, dataset))
    }

    #[test]
    fn test_end_to_end_split_with_failed_second_batch() -> Result<()> {
        let (_temp, dataset) = three_record_dataset()?;

        // First batch [0, 1] succeeded, second batch [2] failed permanently.
        let mut map = ResultMap::new();
        apply_entries(
            &mut map,
            &[
                json!({"index": 0, "TEST": "INCLUDE"}),
                json!({"index": 1, "TEST": "EXCLUDE", "REASON": "TOPIC"}),
            ],
        );
        finalize(&mut map, dataset.len());

        let out = tempdir()?;
        let summary = write_reports(&dataset, &map, "cleaned.csv", out.path())?;

        assert_eq!(summary.total, 3);
        assert_eq!(summary.included, 2);
        assert_eq!(summary.excluded, 1);
        assert_eq!(summary.reason_counts.get("TOPIC"), Some(&1));

        let included = std::fs::read_to_string(out.path().join("included.csv"))?;
        assert!(included.contains("Paper A"));
        assert!(included.contains("Paper C"));
        assert!(!included.contains("Paper B"));
        assert!(!included.contains("REASON"));

        let excluded = std::fs::read_to_string(out.path().join("excluded.csv"))?;
        assert!(excluded.starts_with("DOI,Title,Abstract,REASON"));
        assert!(excluded.contains("10.1/b,Paper B,Beta,TOPIC"));
        assert!(!excluded.contains("Paper A"));

        let log = std::fs::read_to_string(out.path().join("log.txt"))?;
        assert!(log.contains("Total rows processed: 3"));
        assert!(log.contains("Included: 2"));
        assert!(log.contains("Excluded: 1"));
        assert!(log.contains("- TOPIC: 1"));
        Ok(())
    }

    #[test]
    fn test_empty_reason_bucketed_as_unknown() -> Result<()> {
        let (_temp, dataset) = three_record_dataset()?;

        let mut map = ResultMap::new();
        apply_entries(
            &mut map,
            &[
                json!({"index": 0, "TEST": "EXCLUDE"}),
                json!({"index": 1, "TEST": "EXCLUDE", "REASON": "LANGUAGE"}),
            ],
        );
        finalize(&mut map, dataset.len());

        let out = tempdir()?;
        let summary = write_reports(&dataset, &map, "cleaned.csv", out.path())?;

        assert_eq!(summary.reason_counts.get(UNKNOWN_REASON), Some(&1));
        assert_eq!(summary.reason_counts.get("LANGUAGE"), Some(&1));

        let excluded = std::fs::read_to_string(out.path().join("excluded.csv"))?;
        assert!(excluded.contains("10.1/a,Paper A,Alpha,\n") || excluded.contains("10.1/a,Paper A,Alpha,\r\n"));
        Ok(())
    }

    #[test]
    fn test_all_defaulted_run_reports_everything_included() -> Result<()> {
        // Degenerate case: zero batches succeeded.
        let (_temp, dataset) = three_record_dataset()?;
        let mut map = ResultMap::new();
        finalize(&mut map, dataset.len());

        let out = tempdir()?;
        let summary = write_reports(&dataset, &map, "cleaned.csv", out.path())?;

        assert_eq!(summary.included, 3);
        assert_eq!(summary.excluded, 0);
        assert!(summary.reason_counts.is_empty());
        Ok(())
    }
}
