//! Verdict reconciliation.
//!
//! Merges parsed model entries into the running result map and applies the
//! fail-open default for records that never received a verdict. An entry with
//! a malformed index is skipped with a warning; the rest of its batch still
//! applies.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Screening decision for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Include,
    Exclude,
}

/// Decision plus audit reason. The reason is non-empty only for exclusions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: String,
}

impl Verdict {
    /// The fail-open default: include, no reason.
    pub fn include() -> Self {
        Self {
            decision: Decision::Include,
            reason: String::new(),
        }
    }
}

/// Verdicts accumulated across all batches, keyed by record index
pub type ResultMap = BTreeMap<usize, Verdict>;

/// Apply one batch worth of parsed entries to the result map.
///
/// TEST is upper-cased, then exact-matched against "INCLUDE"; any other value
/// becomes EXCLUDE (fail-safe). REASON is read only for exclusions. Applying
/// the same entries twice is idempotent; the last write for an index wins.
pub fn apply_entries(map: &mut ResultMap, entries: &[Value]) {
    for entry in entries {
        let Some(index) = coerce_index(entry.get("index")) else {
            warn!(entry = %entry, "Skipping verdict entry with malformed index");
            continue;
        };

        let test = entry
            .get("TEST")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_uppercase();
        let decision = if test == "INCLUDE" {
            Decision::Include
        } else {
            Decision::Exclude
        };

        let reason = match decision {
            Decision::Exclude => entry
                .get("REASON")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            Decision::Include => String::new(),
        };

        map.insert(index, Verdict { decision, reason });
    }
}

/// Default every record absent from the map to INCLUDE with empty reason.
///
/// Fail-open: a batch that died must not silently drop papers from
/// consideration. Run once after all batches.
pub fn finalize(map: &mut ResultMap, record_count: usize) {
    for index in 0..record_count {
        map.entry(index).or_insert_with(Verdict::include);
    }
}

/// Coerce a JSON index value to usize; accepts numbers and numeric strings.
fn coerce_index(value: Option<&Value>) -> Option<usize> {
    match value? {
        Value::Number(n) => n.as_u64().map(|v| v as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(entries: Vec<Value>) -> ResultMap {
        let mut map = ResultMap::new();
        apply_entries(&mut map, &entries);
        map
    }

    #[test]
    fn test_include_and_exclude_with_reason() {
        let map = apply(vec![
            json!({"index": 0, "TEST": "INCLUDE"}),
            json!({"index": 1, "TEST": "EXCLUDE", "REASON": "TOPIC"}),
        ]);
        assert_eq!(map[&0].decision, Decision::Include);
        assert_eq!(map[&0].reason, "");
        assert_eq!(map[&1].decision, Decision::Exclude);
        assert_eq!(map[&1].reason, "TOPIC");
    }

    #[test]
    fn test_lowercase_include_normalizes_to_include() {
        // Upper-case first, then exact-match: "include" and "Include" both
        // count as INCLUDE.
        let map = apply(vec![
            json!({"index": 0, "TEST": "include"}),
            json!({"index": 1, "TEST": "Include"}),
        ]);
        assert_eq!(map[&0].decision, Decision::Include);
        assert_eq!(map[&1].decision, Decision::Include);
    }

    #[test]
    fn test_malformed_tokens_become_exclude() {
        let map = apply(vec![
            json!({"index": 0, "TEST": "YES"}),
            json!({"index": 1, "TEST": "INCLUDED"}),
            json!({"index": 2, "TEST": ""}),
            json!({"index": 3}),
            json!({"index": 4, "TEST": 1}),
        ]);
        for verdict in map.values() {
            assert_eq!(verdict.decision, Decision::Exclude);
        }
    }

    #[test]
    fn test_reason_ignored_for_includes() {
        let map = apply(vec![json!({"index": 0, "TEST": "INCLUDE", "REASON": "TOPIC"})]);
        assert_eq!(map[&0].decision, Decision::Include);
        assert_eq!(map[&0].reason, "");
    }

    #[test]
    fn test_string_index_coerced() {
        let map = apply(vec![json!({"index": "7", "TEST": "EXCLUDE", "REASON": "LANGUAGE"})]);
        assert_eq!(map[&7].reason, "LANGUAGE");
    }

    #[test]
    fn test_malformed_index_skipped_rest_applied() {
        let map = apply(vec![
            json!({"index": "seven", "TEST": "INCLUDE"}),
            json!({"TEST": "INCLUDE"}),
            json!({"index": -1, "TEST": "INCLUDE"}),
            json!({"index": 2, "TEST": "EXCLUDE", "REASON": "TOPIC"}),
        ]);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&2].decision, Decision::Exclude);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let entries = vec![
            json!({"index": 0, "TEST": "INCLUDE"}),
            json!({"index": 1, "TEST": "EXCLUDE", "REASON": "LANGUAGE"}),
        ];
        let mut once = ResultMap::new();
        apply_entries(&mut once, &entries);

        let mut twice = ResultMap::new();
        apply_entries(&mut twice, &entries);
        apply_entries(&mut twice, &entries);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_finalize_defaults_missing_to_include() {
        let mut map = apply(vec![json!({"index": 1, "TEST": "EXCLUDE", "REASON": "TOPIC"})]);
        finalize(&mut map, 4);

        assert_eq!(map.len(), 4);
        for index in [0, 2, 3] {
            assert_eq!(map[&index], Verdict::include());
        }
        assert_eq!(map[&1].decision, Decision::Exclude);
    }

    #[test]
    fn test_finalize_preserves_existing_verdicts() {
        let mut map = ResultMap::new();
        map.insert(
            0,
            Verdict {
                decision: Decision::Exclude,
                reason: "PUBLICATION_TYPE".to_string(),
            },
        );
        finalize(&mut map, 1);
        assert_eq!(map[&0].reason, "PUBLICATION_TYPE");
    }
}
