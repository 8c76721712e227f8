//! Console output formatter for consultation rounds

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use mdt_domain::{CaseState, Conflict, ConflictSeverity, Role};
use std::collections::BTreeMap;

/// Formats consultation results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the full report of the current round
    pub fn format_report(state: &CaseState) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&format!("MDT Consultation: Round {}", state.round_count)));
        output.push('\n');

        output.push_str(&Self::section_header("Case Digest"));
        output.push_str(&Self::format_structured(&state.structured_info));

        if !state.new_evidence.is_empty() {
            output.push_str(&Self::section_header("New Evidence"));
            for (section, items) in &state.new_evidence {
                for item in items {
                    output.push_str(&format!("  * {} {}\n", format!("[{}]", section).dimmed(), item));
                }
            }
        }

        output.push_str(&Self::section_header("Team"));
        output.push_str(&format!("  {}\n", Self::format_roles(&state.selected_agents)));

        if !state.specialist_summaries.is_empty() {
            output.push_str(&Self::section_header("Specialist Summaries"));
            for (role, summary) in &state.specialist_summaries {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!("── {} ──", role).yellow().bold(),
                    summary
                ));
            }
        }

        if !state.conflicts.is_empty() {
            output.push_str(&Self::section_header("Conflicts"));
            output.push_str(&Self::format_conflicts(&state.conflicts));
        }

        if !state.discussion_notes.is_empty() {
            output.push_str(&Self::section_header("Discussion"));
            output.push_str(&format!("{}\n", state.discussion_notes));
        }

        if !state.moderator_summary.is_empty() {
            output.push_str(&Self::section_header("Moderator Synthesis"));
            output.push_str(&format!("{}\n", state.moderator_summary));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(state: &CaseState) -> String {
        serde_json::to_string_pretty(state).unwrap_or_else(|_| "{}".to_string())
    }

    /// The moderator's latest reply, or a placeholder when there is none
    pub fn format_reply(state: &CaseState) -> String {
        state
            .chat_history
            .iter()
            .rev()
            .take_while(|m| !m.is_user())
            .find(|m| m.is_from(Role::Moderator))
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "(no moderator reply this round)".dimmed().to_string())
    }

    /// One line per conflict, colored by severity
    pub fn format_conflicts(conflicts: &[Conflict]) -> String {
        conflicts
            .iter()
            .map(|conflict| {
                let label = format!("[{}]", conflict.severity.as_str());
                let label = match conflict.severity {
                    ConflictSeverity::Warning => label.yellow().bold(),
                    ConflictSeverity::Success => label.green().bold(),
                    ConflictSeverity::Info => label.cyan().bold(),
                };
                format!(
                    "  {} {}\n      {}\n",
                    label,
                    conflict.issue.bold(),
                    conflict.description
                )
            })
            .collect()
    }

    pub fn format_structured(info: &BTreeMap<String, String>) -> String {
        if info.is_empty() {
            return format!("  {}\n", "(empty)".dimmed());
        }
        info.iter()
            .map(|(key, value)| {
                format!("  {} {}\n", format!("{}:", key).cyan(), Self::indent_tail(value, "    "))
            })
            .collect()
    }

    pub fn format_roles(roles: &[Role]) -> String {
        if roles.is_empty() {
            return "none".dimmed().to_string();
        }
        roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent every line but the first
    fn indent_tail(text: &str, prefix: &str) -> String {
        let mut lines = text.lines();
        let first = lines.next().unwrap_or_default().to_string();
        lines.fold(first, |acc, line| format!("{}\n{}{}", acc, prefix, line))
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, state: &CaseState) -> String {
        Self::format_report(state)
    }

    fn format_json(&self, state: &CaseState) -> String {
        Self::format_json(state)
    }

    fn format_reply(&self, state: &CaseState) -> String {
        Self::format_reply(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdt_domain::{CaseText, ChatMessage, StateDelta};

    fn no_color() {
        colored::control::set_override(false);
    }

    fn finished_round() -> CaseState {
        let mut state = CaseState::new();
        state.submit_input(&CaseText::try_new("patient X").unwrap());
        state.apply(
            StateDelta::default()
                .with_structured_info([("imaging".to_string(), "UIP".to_string())].into())
                .with_selected_agents(vec![Role::Radiologist])
                .with_summary(Role::Radiologist, "Definite UIP.")
                .with_conflicts(vec![Conflict::no_conflicts()])
                .with_moderator_summary("IPF likely.")
                .with_chat(ChatMessage::from_role(Role::Moderator, "Start antifibrotics.", None)),
        );
        state
    }

    #[test]
    fn test_report_contains_sections() {
        no_color();
        let report = ConsoleFormatter::format_report(&finished_round());
        assert!(report.contains("Round 1"));
        assert!(report.contains("imaging: UIP"));
        assert!(report.contains("Definite UIP."));
        assert!(report.contains("[success]"));
        assert!(report.contains("IPF likely."));
    }

    #[test]
    fn test_reply_is_latest_moderator_turn() {
        no_color();
        let mut state = finished_round();
        assert_eq!(ConsoleFormatter::format_reply(&state), "Start antifibrotics.");

        state.submit_input(&CaseText::try_new("follow-up").unwrap());
        assert_eq!(
            ConsoleFormatter::format_reply(&state),
            "(no moderator reply this round)"
        );
    }

    #[test]
    fn test_json_round_trips() {
        let state = finished_round();
        let json = ConsoleFormatter::format_json(&state);
        let back: CaseState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_structured_multiline_value_is_indented() {
        no_color();
        let info = [("history".to_string(), "line one\nline two".to_string())].into();
        assert_eq!(
            ConsoleFormatter::format_structured(&info),
            "  history: line one\n    line two\n"
        );
    }
}
