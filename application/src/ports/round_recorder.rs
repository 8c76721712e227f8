//! Round recorder port
//!
//! Write-behind persistence of finished rounds. A recorder failure is
//! reported to the caller but never fails the round itself.

use mdt_domain::{CaseState, Conflict, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How the team got to its answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub structured_info: BTreeMap<String, String>,
    pub selected_agents: Vec<Role>,
    pub specialist_opinions: BTreeMap<Role, String>,
    pub specialist_summaries: BTreeMap<Role, String>,
    pub conflicts: Vec<Conflict>,
    pub discussion_notes: String,
}

/// What the team answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSnapshot {
    pub moderator_summary: String,
    pub reply: Option<String>,
}

/// Everything persisted for one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub user_input: String,
    pub new_evidence: BTreeMap<String, Vec<String>>,
    pub process: ProcessSnapshot,
    pub output: OutputSnapshot,
}

impl RoundRecord {
    /// Capture the current round from the Case State.
    pub fn from_state(state: &CaseState) -> Self {
        let reply = state
            .chat_history
            .iter()
            .rev()
            .take_while(|m| !m.is_user())
            .find(|m| m.is_from(Role::Moderator))
            .map(|m| m.content.clone());

        Self {
            user_input: state.raw_case_text.clone(),
            new_evidence: state.new_evidence.clone(),
            process: ProcessSnapshot {
                structured_info: state.structured_info.clone(),
                selected_agents: state.selected_agents.clone(),
                specialist_opinions: state.specialist_opinions.clone(),
                specialist_summaries: state.specialist_summaries.clone(),
                conflicts: state.conflicts.clone(),
                discussion_notes: state.discussion_notes.clone(),
            },
            output: OutputSnapshot {
                moderator_summary: state.moderator_summary.clone(),
                reply,
            },
        }
    }
}

/// Port for persisting finished rounds.
///
/// Re-saving the same `round` for a session overwrites the earlier record.
pub trait RoundRecorder: Send + Sync {
    fn append_round(
        &self,
        session_id: &str,
        round: u32,
        record: &RoundRecord,
    ) -> Result<(), RecordError>;
}

/// No-op implementation for tests and when recording is disabled.
pub struct NoRoundRecorder;

impl RoundRecorder for NoRoundRecorder {
    fn append_round(&self, _session_id: &str, _round: u32, _record: &RoundRecord) -> Result<(), RecordError> {
        Ok(())
    }
}
