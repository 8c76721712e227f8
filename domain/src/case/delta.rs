//! Node output deltas.

use super::chat::ChatMessage;
use crate::consultation::conflict::Conflict;
use crate::role::{AgentStatus, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The partial update one workflow node returns.
///
/// Replace-policy fields are `Option`: `None` leaves the state untouched,
/// `Some` overwrites it. Merge and append fields are plain collections and
/// an empty collection is a no-op. See [`CaseState::apply`] for the reducer
/// table.
///
/// [`CaseState::apply`]: super::state::CaseState::apply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_info: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_evidence: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_agents: Option<Vec<Role>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<Conflict>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussion_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator_summary: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specialist_opinions: BTreeMap<Role, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specialist_summaries: BTreeMap<Role, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub agent_status: BTreeMap<Role, AgentStatus>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub execution_logs: Vec<String>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structured_info(mut self, info: BTreeMap<String, String>) -> Self {
        self.structured_info = Some(info);
        self
    }

    pub fn with_new_evidence(mut self, evidence: BTreeMap<String, Vec<String>>) -> Self {
        self.new_evidence = Some(evidence);
        self
    }

    pub fn with_selected_agents(mut self, roles: Vec<Role>) -> Self {
        self.selected_agents = Some(roles);
        self
    }

    pub fn with_conflicts(mut self, conflicts: Vec<Conflict>) -> Self {
        self.conflicts = Some(conflicts);
        self
    }

    pub fn with_discussion_notes(mut self, notes: impl Into<String>) -> Self {
        self.discussion_notes = Some(notes.into());
        self
    }

    pub fn with_moderator_summary(mut self, summary: impl Into<String>) -> Self {
        self.moderator_summary = Some(summary.into());
        self
    }

    pub fn with_opinion(mut self, role: Role, opinion: impl Into<String>) -> Self {
        self.specialist_opinions.insert(role, opinion.into());
        self
    }

    pub fn with_summary(mut self, role: Role, summary: impl Into<String>) -> Self {
        self.specialist_summaries.insert(role, summary.into());
        self
    }

    pub fn with_status(mut self, role: Role, status: AgentStatus) -> Self {
        self.agent_status.insert(role, status);
        self
    }

    pub fn with_chat(mut self, message: ChatMessage) -> Self {
        self.chat_history.push(message);
        self
    }

    pub fn with_log(mut self, line: impl Into<String>) -> Self {
        self.execution_logs.push(line.into());
        self
    }

    /// Whether applying this delta would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
