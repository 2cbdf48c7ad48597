//! Screening prompts for batch abstract classification.
//!
//! Contains the fixed instruction template that defines the verdict schema the
//! response parser depends on, plus the prompt builder for one batch.

use crate::dataset::Record;
use crate::error::Result;
use serde::Serialize;

/// Fixed instruction text defining the output contract for the model.
///
/// The response parser and reconciler rely on this schema: a single JSON array
/// of `{index, TEST, REASON?}` objects, uppercase tokens, REASON only on
/// EXCLUDE, with the stated priority order for exclusion reasons.
pub const PROMPT_INSTRUCTION: &str = r#"You will receive a JSON array of papers (each with index, title, abstract). For each paper return an object with keys:
- index: integer, same as input
- TEST: either "INCLUDE" or "EXCLUDE"
- REASON: only present when TEST is "EXCLUDE" - one of: "TOPIC", "PUBLICATION_TYPE", "LANGUAGE"

Rules:
1) Return ONLY a single JSON array and nothing else - no explanation, no markdown, no extra text.
2) Output must be valid JSON parseable by a strict JSON parser.
3) Use uppercase for TEST and REASON exactly as specified.
4) If multiple exclusion reasons apply, pick the single most important reason using this priority order: TOPIC > PUBLICATION_TYPE > LANGUAGE.
5) If title or abstract are empty or insufficient to decide, default to "EXCLUDE" with REASON "TOPIC".
6) Base your decision ONLY on the provided title and abstract text; do not infer outside information.

Example (must match this structure exactly):
[{"index":0,"TEST":"INCLUDE"},{"index":1,"TEST":"EXCLUDE","REASON":"TOPIC"}]

"#;

/// One paper as serialized into the prompt payload
#[derive(Serialize)]
struct PromptItem<'a> {
    index: usize,
    title: &'a str,
    #[serde(rename = "abstract")]
    abstract_text: &'a str,
}

/// Build the full prompt for one batch: instruction, screening context, and
/// the JSON payload of `{index, title, abstract}` objects.
pub fn build_prompt(context: &str, batch: &[Record]) -> Result<String> {
    let payload: Vec<PromptItem> = batch
        .iter()
        .map(|r| PromptItem {
            index: r.index,
            title: &r.title,
            abstract_text: &r.abstract_text,
        })
        .collect();
    let papers_json = serde_json::to_string_pretty(&payload)?;

    Ok(format!(
        "{}Context:\n{}\n\nPapers:\n{}\n\nRespond now with the JSON array as specified.",
        PROMPT_INSTRUCTION,
        context.trim(),
        papers_json
    ))
}
