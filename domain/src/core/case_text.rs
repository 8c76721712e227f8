//! Case text value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// Free-text clinical input submitted for one consultation round (Value Object)
///
/// Wraps the raw text a clinician typed: history, imaging findings,
/// lab values or a follow-up question. Whitespace-only input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseText {
    content: String,
}

impl CaseText {
    /// Try to create case text, rejecting empty or whitespace-only input
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            Err(DomainError::EmptyCaseText)
        } else {
            Ok(Self { content })
        }
    }

    /// Get the case text content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for CaseText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<&str> for CaseText {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        CaseText::try_new(s)
    }
}

impl TryFrom<String> for CaseText {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        CaseText::try_new(s)
    }
}
