//! Conflict records produced by cross-specialty comparison.

use crate::core::text::{strip_code_fences, value_to_text};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a conflict record.
///
/// `Info` and `Success` are placeholder records (detection skipped, or no
/// disagreement found); `Warning` marks a genuine disagreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Info,
    Warning,
    Success,
}

impl ConflictSeverity {
    /// Map a model-supplied label onto the closed severity set.
    ///
    /// Anything that is not explicitly informational or a success
    /// ("high", "critical", "error", ...) is a warning.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "info" | "information" | "low" | "note" => ConflictSeverity::Info,
            "success" | "ok" | "none" => ConflictSeverity::Success,
            _ => ConflictSeverity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictSeverity::Info => "info",
            ConflictSeverity::Warning => "warning",
            ConflictSeverity::Success => "success",
        }
    }
}

/// One detected disagreement between specialists, or a placeholder record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub issue: String,
    pub description: String,
    pub severity: ConflictSeverity,
}

impl Conflict {
    pub fn new(
        issue: impl Into<String>,
        description: impl Into<String>,
        severity: ConflictSeverity,
    ) -> Self {
        Self {
            issue: issue.into(),
            description: description.into(),
            severity,
        }
    }

    /// Placeholder when fewer than two specialists have submitted a summary.
    pub fn insufficient(summary_count: usize) -> Self {
        Self::new(
            "Conflict detection skipped",
            format!(
                "Only {} specialist summar{} available; at least 2 are needed for comparison.",
                summary_count,
                if summary_count == 1 { "y is" } else { "ies are" }
            ),
            ConflictSeverity::Info,
        )
    }

    /// Placeholder when the comparison found no disagreement.
    pub fn no_conflicts() -> Self {
        Self::new(
            "Detection complete",
            "Specialist opinions are broadly consistent; no material contradictions found.",
            ConflictSeverity::Success,
        )
    }

    /// Placeholder when the detector's answer could not be used.
    pub fn unreadable(reason: impl Into<String>) -> Self {
        Self::new(
            "Conflict detection unavailable",
            reason.into(),
            ConflictSeverity::Info,
        )
    }

    /// Whether this record describes a real disagreement.
    pub fn is_disagreement(&self) -> bool {
        self.severity == ConflictSeverity::Warning
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let issue = map
                    .get("issue")
                    .or_else(|| map.get("title"))
                    .map(value_to_text)
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| "Unnamed issue".to_string());
                let description = map
                    .get("description")
                    .or_else(|| map.get("detail"))
                    .map(value_to_text)
                    .unwrap_or_default();
                let severity = map
                    .get("severity")
                    .and_then(Value::as_str)
                    .map(ConflictSeverity::from_label)
                    .unwrap_or(ConflictSeverity::Warning);
                Some(Self::new(issue, description, severity))
            }
            Value::String(s) if !s.trim().is_empty() => {
                Some(Self::new(s.clone(), String::new(), ConflictSeverity::Warning))
            }
            _ => None,
        }
    }
}

/// Parse the conflict detector's JSON answer.
///
/// Accepts a top-level list or an object exposing the list under
/// `conflicts` or `items`. Returns `None` for any other shape or invalid
/// JSON; an empty `Vec` means the detector genuinely found nothing.
pub fn parse_conflicts(response: &str) -> Option<Vec<Conflict>> {
    let parsed: Value = serde_json::from_str(strip_code_fences(response)).ok()?;
    let items = match &parsed {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("conflicts").or_else(|| map.get("items")) {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };
    Some(items.iter().filter_map(Conflict::from_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_level_list() {
        let response = r#"[{"issue": "Pattern", "description": "UIP vs NSIP", "severity": "warning"}]"#;
        let conflicts = parse_conflicts(response).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].issue, "Pattern");
        assert!(conflicts[0].is_disagreement());
    }

    #[test]
    fn test_parse_nested_keys() {
        let nested = r#"{"conflicts": [{"issue": "A", "description": "B", "severity": "high"}]}"#;
        let conflicts = parse_conflicts(nested).unwrap();
        assert_eq!(conflicts[0].severity, ConflictSeverity::Warning);

        let items = "```json\n{\"items\": []}\n```";
        assert_eq!(parse_conflicts(items), Some(vec![]));
    }

    #[test]
    fn test_parse_unrecognized_shapes() {
        assert_eq!(parse_conflicts(r#"{"result": "none"}"#), None);
        assert_eq!(parse_conflicts("no conflicts found"), None);
        assert_eq!(parse_conflicts("42"), None);
    }

    #[test]
    fn test_missing_fields_default() {
        let conflicts = parse_conflicts(r#"[{"description": "x"}, "Biopsy timing", 7]"#).unwrap();
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].issue, "Unnamed issue");
        assert_eq!(conflicts[0].severity, ConflictSeverity::Warning);
        assert_eq!(conflicts[1].issue, "Biopsy timing");
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(ConflictSeverity::from_label("Info"), ConflictSeverity::Info);
        assert_eq!(ConflictSeverity::from_label("success"), ConflictSeverity::Success);
        assert_eq!(ConflictSeverity::from_label("critical"), ConflictSeverity::Warning);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Conflict::insufficient(1).severity, ConflictSeverity::Info);
        assert!(Conflict::insufficient(0).description.contains("0 specialist summaries"));
        assert_eq!(Conflict::no_conflicts().severity, ConflictSeverity::Success);
        assert!(!Conflict::no_conflicts().is_disagreement());
    }
}
