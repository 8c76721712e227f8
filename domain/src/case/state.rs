//! The Case State aggregate.

use super::chat::ChatMessage;
use super::delta::StateDelta;
use crate::consultation::conflict::Conflict;
use crate::core::case_text::CaseText;
use crate::role::{AgentStatus, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-round snapshots keyed by round number.
pub type RoundHistory<T> = BTreeMap<u32, T>;

/// The mutable record of one consultation session (Aggregate Root)
///
/// Created empty once per session and only ever appended to or selectively
/// overwritten. All node output enters through [`apply`](Self::apply); the
/// only other writers are [`submit_input`](Self::submit_input) and
/// [`begin_round`](Self::begin_round), called before a round's first node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseState {
    pub round_count: u32,
    pub raw_case_text: String,
    pub raw_case_history: Vec<String>,
    pub structured_info: BTreeMap<String, String>,
    pub new_evidence: BTreeMap<String, Vec<String>>,
    pub specialist_opinions: BTreeMap<Role, String>,
    pub specialist_summaries: BTreeMap<Role, String>,
    pub specialist_opinions_history: RoundHistory<BTreeMap<Role, String>>,
    pub specialist_summaries_history: RoundHistory<BTreeMap<Role, String>>,
    pub selected_agents: Vec<Role>,
    pub conflicts: Vec<Conflict>,
    pub discussion_notes: String,
    pub moderator_summary: String,
    pub moderator_summary_history: RoundHistory<String>,
    pub chat_history: Vec<ChatMessage>,
    pub agent_status: BTreeMap<Role, AgentStatus>,
    pub execution_logs: Vec<String>,
}

impl CaseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user submission and advance the round counter.
    ///
    /// Returns the new round number.
    pub fn submit_input(&mut self, case_text: &CaseText) -> u32 {
        self.round_count += 1;
        let text = case_text.content();
        self.raw_case_text = text.to_string();
        self.raw_case_history
            .push(format!("[Round {} input]\n{}", self.round_count, text));
        self.chat_history.push(ChatMessage::user(text));
        self.round_count
    }

    /// Reseed the per-round views at the start of the current round.
    ///
    /// Live opinions and summaries become a copy of the previous round's
    /// history entry, and the current round's history entry is seeded with
    /// every previous key it does not already hold. The moderator summary and
    /// new evidence are reset; everything else is left for the nodes to
    /// overwrite.
    pub fn begin_round(&mut self) {
        let round = self.round_count;
        carry_forward(
            &mut self.specialist_opinions,
            &mut self.specialist_opinions_history,
            round,
        );
        carry_forward(
            &mut self.specialist_summaries,
            &mut self.specialist_summaries_history,
            round,
        );
        self.moderator_summary.clear();
        self.new_evidence.clear();
    }

    /// Apply a node's delta with the per-field reducers.
    ///
    /// | Field | Reducer |
    /// |---|---|
    /// | structured_info, new_evidence, selected_agents, conflicts, discussion_notes, moderator_summary, round_count | replace |
    /// | specialist_opinions, specialist_summaries, agent_status | shallow merge, new keys win |
    /// | chat_history, execution_logs | append |
    ///
    /// Opinions, summaries and the moderator summary are mirrored into the
    /// current round's history entry, which is only ever merged into.
    pub fn apply(&mut self, delta: StateDelta) {
        if let Some(round) = delta.round_count {
            self.round_count = round;
        }
        if let Some(info) = delta.structured_info {
            self.structured_info = info;
        }
        if let Some(evidence) = delta.new_evidence {
            self.new_evidence = evidence;
        }
        if let Some(selected) = delta.selected_agents {
            self.selected_agents = selected;
        }
        if let Some(conflicts) = delta.conflicts {
            self.conflicts = conflicts;
        }
        if let Some(notes) = delta.discussion_notes {
            self.discussion_notes = notes;
        }
        if let Some(summary) = delta.moderator_summary {
            self.moderator_summary_history
                .insert(self.round_count, summary.clone());
            self.moderator_summary = summary;
        }

        merge_with_history(
            &mut self.specialist_opinions,
            &mut self.specialist_opinions_history,
            self.round_count,
            delta.specialist_opinions,
        );
        merge_with_history(
            &mut self.specialist_summaries,
            &mut self.specialist_summaries_history,
            self.round_count,
            delta.specialist_summaries,
        );
        self.agent_status.extend(delta.agent_status);

        self.chat_history.extend(delta.chat_history);
        self.execution_logs.extend(delta.execution_logs);
    }

    pub fn is_first_round(&self) -> bool {
        self.round_count <= 1
    }

    /// Transcript restricted to user and moderator turns.
    pub fn dialogue(&self) -> Vec<&ChatMessage> {
        self.chat_history
            .iter()
            .filter(|m| m.is_user() || m.is_from(Role::Moderator))
            .collect()
    }

    /// Most recent opinion of a role, live view first, then history.
    pub fn latest_opinion(&self, role: Role) -> Option<&str> {
        self.specialist_opinions
            .get(&role)
            .or_else(|| {
                self.specialist_opinions_history
                    .values()
                    .rev()
                    .find_map(|round| round.get(&role))
            })
            .map(String::as_str)
    }

    /// Status every role starts the round with: idle when enabled, offline otherwise.
    pub fn initial_statuses(enabled: &[Role]) -> BTreeMap<Role, AgentStatus> {
        Role::ALL
            .into_iter()
            .map(|role| {
                let status = if enabled.contains(&role) {
                    AgentStatus::Idle
                } else {
                    AgentStatus::Offline
                };
                (role, status)
            })
            .collect()
    }
}

fn carry_forward(
    live: &mut BTreeMap<Role, String>,
    history: &mut RoundHistory<BTreeMap<Role, String>>,
    round: u32,
) {
    let previous = round
        .checked_sub(1)
        .and_then(|r| history.get(&r))
        .cloned()
        .unwrap_or_default();

    let current = history.entry(round).or_default();
    for (role, text) in &previous {
        current.entry(*role).or_insert_with(|| text.clone());
    }
    *live = previous;
}

fn merge_with_history(
    live: &mut BTreeMap<Role, String>,
    history: &mut RoundHistory<BTreeMap<Role, String>>,
    round: u32,
    incoming: BTreeMap<Role, String>,
) {
    if incoming.is_empty() {
        return;
    }
    let entry = history.entry(round).or_default();
    for (role, text) in incoming {
        entry.insert(role, text.clone());
        live.insert(role, text);
    }
}
