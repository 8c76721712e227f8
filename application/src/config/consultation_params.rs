//! Consultation parameters for round execution.
//!
//! [`ConsultationParams`] groups the static parameters that control how a
//! round is executed. These are application-layer concerns, not domain
//! policy; per-role model bindings live in [`RoleModels`](mdt_domain::RoleModels).

use mdt_domain::{Role, dedup_roles};
use serde::{Deserialize, Serialize};

/// Round execution parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationParams {
    /// Roles taking part in the consultation.
    pub enabled_roles: Vec<Role>,
    /// Bound of the event queue between executor and consumer.
    pub event_capacity: usize,
    /// Whether specialist opinions are appended to the transcript.
    pub record_specialist_turns: bool,
}

impl Default for ConsultationParams {
    fn default() -> Self {
        Self {
            enabled_roles: vec![
                Role::CaseOrganizer,
                Role::Radiologist,
                Role::Pathologist,
                Role::Pulmonologist,
                Role::Rheumatologist,
                Role::Moderator,
            ],
            event_capacity: 256,
            record_specialist_turns: true,
        }
    }
}

impl ConsultationParams {
    // ==================== Builder Methods ====================

    pub fn with_enabled_roles(mut self, roles: Vec<Role>) -> Self {
        self.enabled_roles = dedup_roles(&roles);
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn with_record_specialist_turns(mut self, record: bool) -> Self {
        self.record_specialist_turns = record;
        self
    }

    // ==================== Queries ====================

    pub fn is_enabled(&self, role: Role) -> bool {
        self.enabled_roles.contains(&role)
    }

    /// Whether the full moderated pipeline runs (router, conflict detection,
    /// discussion, moderator) rather than the serial specialist chain.
    pub fn is_moderated(&self) -> bool {
        self.is_enabled(Role::Moderator)
    }

    /// Every role that runs in a round, in catalogue order.
    ///
    /// The router, conflict detector and discussion stages follow the
    /// moderator: they are active exactly when it is enabled.
    pub fn active_roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| {
                if role.is_moderator_stage() {
                    self.is_moderated()
                } else {
                    self.is_enabled(*role)
                }
            })
            .collect()
    }

    /// Enabled specialists in catalogue order.
    pub fn enabled_specialists(&self) -> Vec<Role> {
        Role::SPECIALISTS
            .into_iter()
            .filter(|role| self.is_enabled(*role))
            .collect()
    }
}
