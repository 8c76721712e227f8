//! Live rendering of a round's event stream

use crate::output::console::ConsoleFormatter;
use colored::Colorize;
use mdt_application::{ConsultationEvent, StreamTarget};
use mdt_domain::{AgentStatus, OutputFormat, Role, StateDelta};

/// Turns consultation events into terminal text.
///
/// Concurrent specialists interleave their tokens; a header is printed
/// whenever the stream switches to another role or target.
pub struct TranscriptPrinter {
    format: OutputFormat,
    show_status: bool,
    current: Option<(Role, StreamTarget)>,
    at_line_start: bool,
}

impl TranscriptPrinter {
    pub fn new(format: OutputFormat, show_status: bool) -> Self {
        Self {
            format,
            show_status,
            current: None,
            at_line_start: true,
        }
    }

    /// Text to print for one event, if any.
    pub fn render(&mut self, event: &ConsultationEvent) -> Option<String> {
        let text = match event {
            ConsultationEvent::Token {
                role,
                content,
                target,
            } => self.token(*role, content, *target),
            ConsultationEvent::Status { role, status } => self.status(*role, *status),
            ConsultationEvent::NodeFinished { role, data } => self.node_finished(*role, data),
            ConsultationEvent::Error { content } => {
                Some(self.line(format!("{} {}", "error:".red().bold(), content)))
            }
            ConsultationEvent::Log { .. } => None,
            ConsultationEvent::Done => {
                self.current = None;
                (!self.at_line_start).then(|| {
                    self.at_line_start = true;
                    "\n".to_string()
                })
            }
        }?;
        if let Some(last) = text.chars().last() {
            self.at_line_start = last == '\n';
        }
        Some(text)
    }

    fn token(&mut self, role: Role, content: &str, target: StreamTarget) -> Option<String> {
        match self.format {
            OutputFormat::Json => None,
            OutputFormat::Reply if target != StreamTarget::Chat => None,
            OutputFormat::Reply => Some(content.to_string()),
            OutputFormat::Transcript => {
                if self.current == Some((role, target)) {
                    return Some(content.to_string());
                }
                self.current = Some((role, target));
                let header = format!("── {} · {} ──", role, target_label(target));
                Some(format!("{}{}\n{}", self.break_line(), header.yellow().bold(), content))
            }
        }
    }

    fn status(&mut self, role: Role, status: AgentStatus) -> Option<String> {
        if !self.show_status || !self.format.streams_stages() || !status.is_active() {
            return None;
        }
        self.current = None;
        Some(self.line(format!("{} {} {}", "▸".cyan(), role.as_str().bold(), status.as_str().dimmed())))
    }

    fn node_finished(&mut self, role: Role, delta: &StateDelta) -> Option<String> {
        if !self.format.streams_stages() {
            return None;
        }
        let body = match role {
            Role::CaseOrganizer => {
                let reply = delta.chat_history.first()?;
                format!("{}\n{}", "── Case Organizer ──".yellow().bold(), reply.content)
            }
            Role::Router => format!(
                "{} {}",
                "Selected specialists:".cyan().bold(),
                ConsoleFormatter::format_roles(delta.selected_agents.as_deref()?)
            ),
            Role::ConflictDetector => format!(
                "{}\n{}",
                "Conflicts:".cyan().bold(),
                ConsoleFormatter::format_conflicts(delta.conflicts.as_deref()?).trim_end()
            ),
            _ => return None,
        };
        self.current = None;
        Some(self.line(body))
    }

    /// `text` on its own line(s).
    fn line(&self, text: String) -> String {
        format!("{}{}\n", self.break_line(), text)
    }

    fn break_line(&self) -> &'static str {
        if self.at_line_start { "" } else { "\n" }
    }
}

fn target_label(target: StreamTarget) -> &'static str {
    match target {
        StreamTarget::Opinion => "analysis",
        StreamTarget::SpecialistSummary => "summary",
        StreamTarget::Discussion => "discussion",
        StreamTarget::Summary => "synthesis",
        StreamTarget::Chat => "reply",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdt_domain::{ChatMessage, Conflict};

    fn token(role: Role, content: &str, target: StreamTarget) -> ConsultationEvent {
        ConsultationEvent::Token {
            role,
            content: content.to_string(),
            target,
        }
    }

    fn render_all(printer: &mut TranscriptPrinter, events: &[ConsultationEvent]) -> String {
        events.iter().filter_map(|e| printer.render(e)).collect()
    }

    #[test]
    fn test_header_on_stream_switch() {
        colored::control::set_override(false);
        let mut printer = TranscriptPrinter::new(OutputFormat::Transcript, false);
        let out = render_all(
            &mut printer,
            &[
                token(Role::Radiologist, "UIP ", StreamTarget::Opinion),
                token(Role::Radiologist, "pattern", StreamTarget::Opinion),
                token(Role::Pulmonologist, "FVC down", StreamTarget::Opinion),
                ConsultationEvent::Done,
            ],
        );
        assert_eq!(
            out,
            "── Radiologist · analysis ──\nUIP pattern\n── Pulmonologist · analysis ──\nFVC down\n"
        );
    }

    #[test]
    fn test_reply_mode_only_prints_chat() {
        let mut printer = TranscriptPrinter::new(OutputFormat::Reply, true);
        let out = render_all(
            &mut printer,
            &[
                ConsultationEvent::Status {
                    role: Role::Moderator,
                    status: AgentStatus::Working,
                },
                token(Role::Moderator, "internal", StreamTarget::Summary),
                token(Role::Moderator, "Dear colleague", StreamTarget::Chat),
                ConsultationEvent::Done,
            ],
        );
        assert_eq!(out, "Dear colleague\n");
    }

    #[test]
    fn test_json_mode_prints_nothing_but_errors() {
        colored::control::set_override(false);
        let mut printer = TranscriptPrinter::new(OutputFormat::Json, true);
        assert!(printer.render(&token(Role::Moderator, "x", StreamTarget::Chat)).is_none());
        assert_eq!(
            printer
                .render(&ConsultationEvent::Error {
                    content: "boom".into()
                })
                .as_deref(),
            Some("error: boom\n")
        );
    }

    #[test]
    fn test_node_summaries() {
        colored::control::set_override(false);
        let mut printer = TranscriptPrinter::new(OutputFormat::Transcript, false);

        let organizer = StateDelta::default()
            .with_chat(ChatMessage::from_role(Role::CaseOrganizer, "Digest ready.", None));
        let router = StateDelta::default().with_selected_agents(vec![Role::Radiologist]);
        let detector = StateDelta::default().with_conflicts(vec![Conflict::no_conflicts()]);

        let out = render_all(
            &mut printer,
            &[
                ConsultationEvent::NodeFinished {
                    role: Role::CaseOrganizer,
                    data: organizer,
                },
                ConsultationEvent::NodeFinished {
                    role: Role::Router,
                    data: router,
                },
                ConsultationEvent::NodeFinished {
                    role: Role::ConflictDetector,
                    data: detector,
                },
            ],
        );
        assert!(out.starts_with("── Case Organizer ──\nDigest ready.\n"));
        assert!(out.contains("Selected specialists: Radiologist\n"));
        assert!(out.contains("Conflicts:\n  [success]"));
    }

    #[test]
    fn test_status_line_breaks_token_stream() {
        colored::control::set_override(false);
        let mut printer = TranscriptPrinter::new(OutputFormat::Transcript, true);
        let out = render_all(
            &mut printer,
            &[
                token(Role::Radiologist, "partial", StreamTarget::Opinion),
                ConsultationEvent::Status {
                    role: Role::Pathologist,
                    status: AgentStatus::Working,
                },
                ConsultationEvent::Status {
                    role: Role::Pathologist,
                    status: AgentStatus::Done,
                },
            ],
        );
        assert_eq!(
            out,
            "── Radiologist · analysis ──\npartial\n▸ Pathologist working\n"
        );
    }
}
