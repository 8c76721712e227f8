//! Case organizer output parsing.

use crate::core::error::DomainError;
use crate::core::text::{strip_code_fences, value_to_text};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Structured digest produced by the case organizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredCase {
    /// Canonical digest: field name → text. Replaces the previous digest wholesale.
    pub structured_info: BTreeMap<String, String>,
    /// What the latest input added: category → items.
    pub new_evidence: BTreeMap<String, Vec<String>>,
}

/// Parse the organizer's JSON answer.
///
/// On an update round the answer is expected as
/// `{"updated_case": {...}, "new_evidence": {...}}`; an answer without
/// `updated_case` is taken as a full digest with no new evidence. The
/// first round's answer is always a full digest.
pub fn parse_structuring(response: &str, is_update: bool) -> Result<StructuredCase, DomainError> {
    let parsed: Value = serde_json::from_str(strip_code_fences(response))
        .map_err(|e| DomainError::InvalidModelOutput(e.to_string()))?;
    let Value::Object(root) = parsed else {
        return Err(DomainError::InvalidModelOutput(
            "structured case must be a JSON object".to_string(),
        ));
    };

    if is_update && let Some(Value::Object(updated)) = root.get("updated_case") {
        let new_evidence = match root.get("new_evidence") {
            Some(Value::Object(evidence)) => evidence_map(evidence),
            _ => BTreeMap::new(),
        };
        return Ok(StructuredCase {
            structured_info: text_map(updated),
            new_evidence,
        });
    }

    Ok(StructuredCase {
        structured_info: text_map(&root),
        new_evidence: BTreeMap::new(),
    })
}

fn text_map(object: &Map<String, Value>) -> BTreeMap<String, String> {
    object
        .iter()
        .map(|(key, value)| (key.clone(), value_to_text(value)))
        .collect()
}

fn evidence_map(object: &Map<String, Value>) -> BTreeMap<String, Vec<String>> {
    object
        .iter()
        .filter_map(|(category, value)| {
            let items: Vec<String> = match value {
                Value::Array(items) => items.iter().map(value_to_text).collect(),
                Value::Null => Vec::new(),
                other => vec![value_to_text(other)],
            };
            let items: Vec<String> = items.into_iter().filter(|s| !s.trim().is_empty()).collect();
            (!items.is_empty()).then(|| (category.clone(), items))
        })
        .collect()
}
