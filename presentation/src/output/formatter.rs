//! Output formatter trait

use mdt_domain::CaseState;

/// Trait for formatting a finished consultation round
pub trait OutputFormatter {
    /// Format the round as a readable report
    fn format_report(&self, state: &CaseState) -> String;

    /// Format the whole Case State as JSON
    fn format_json(&self, state: &CaseState) -> String;

    /// Format only the moderator's latest reply
    fn format_reply(&self, state: &CaseState) -> String;
}
