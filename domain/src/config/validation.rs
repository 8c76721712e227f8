//! Structured configuration issues.
//!
//! Loaders report every problem they find instead of stopping at the first,
//! so the CLI can print them together and decide whether to continue.

use std::fmt;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A model binding names an empty model.
    EmptyModel,
    /// A role name that is not part of the consultation team.
    UnknownRole,
    /// The event queue must hold at least one event.
    ZeroEventCapacity,
    /// A temperature outside the range providers accept.
    TemperatureOutOfRange,
    /// A routing entry points to an endpoint that is not defined.
    UnknownEndpoint,
    /// No specialist is enabled, so the router has nothing to choose from.
    NoSpecialists,
    /// The default endpoint has no API key.
    MissingApiKey,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// True if any issue in the slice is fatal.
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(ConfigIssue::is_error)
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_errors_returns_true_for_errors() {
        let issues = vec![
            ConfigIssue::warning(ConfigIssueCode::NoSpecialists, "w"),
            ConfigIssue::error(ConfigIssueCode::EmptyModel, "e"),
        ];
        assert!(ConfigIssue::has_errors(&issues));
    }

    #[test]
    fn has_errors_returns_false_for_warnings_only() {
        let issues = vec![ConfigIssue::warning(ConfigIssueCode::NoSpecialists, "w")];
        assert!(!ConfigIssue::has_errors(&issues));
        assert!(!ConfigIssue::has_errors(&[]));
    }

    #[test]
    fn display_includes_level() {
        let issue = ConfigIssue::error(ConfigIssueCode::UnknownRole, "unknown role 'Dermatologist'");
        assert_eq!(issue.to_string(), "error: unknown role 'Dermatologist'");
    }
}
