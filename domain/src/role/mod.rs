//! Consultation roles.
//!
//! - [`Role`]: the closed set of participants in a consultation round
//! - [`AgentStatus`]: per-role execution status surfaced to consumers

mod status;

pub use status::AgentStatus;

use crate::core::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A participant in the consultation workflow (Value Object)
///
/// The set is closed: every node the workflow can run is one of these.
/// Specialists are the roles the router may fan out to; the remaining
/// roles are fixed stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Structures raw case text into the canonical digest
    CaseOrganizer,
    /// Decides which specialists participate in a round (the moderator's planning step)
    Router,
    Radiologist,
    Pathologist,
    Pulmonologist,
    Rheumatologist,
    /// Compares specialist summaries for disagreement
    ConflictDetector,
    /// Produces consensus notes from conflicts and opinions
    Discussion,
    /// Produces the clinical synthesis and the user-facing reply
    Moderator,
}

impl Role {
    /// Specialists in catalogue order.
    pub const SPECIALISTS: [Role; 4] = [
        Role::Radiologist,
        Role::Pathologist,
        Role::Pulmonologist,
        Role::Rheumatologist,
    ];

    /// Every role, in pipeline order.
    pub const ALL: [Role; 9] = [
        Role::CaseOrganizer,
        Role::Router,
        Role::Radiologist,
        Role::Pathologist,
        Role::Pulmonologist,
        Role::Rheumatologist,
        Role::ConflictDetector,
        Role::Discussion,
        Role::Moderator,
    ];

    /// Display name, also used as the wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::CaseOrganizer => "Case Organizer",
            Role::Router => "Moderator Router",
            Role::Radiologist => "Radiologist",
            Role::Pathologist => "Pathologist",
            Role::Pulmonologist => "Pulmonologist",
            Role::Rheumatologist => "Rheumatologist",
            Role::ConflictDetector => "Conflict Detector",
            Role::Discussion => "Team Discussion",
            Role::Moderator => "Moderator",
        }
    }

    pub fn is_specialist(&self) -> bool {
        Self::SPECIALISTS.contains(self)
    }

    /// Roles whose merged output this role reads when both run in the same round.
    pub fn depends_on(&self) -> &'static [Role] {
        match self {
            Role::Pathologist => &[Role::Radiologist],
            _ => &[],
        }
    }

    /// Pipeline stages that exist only when the moderator is enabled.
    pub fn is_moderator_stage(&self) -> bool {
        matches!(
            self,
            Role::Router | Role::ConflictDetector | Role::Discussion | Role::Moderator
        )
    }

    /// Short clinical focus used when framing a specialist's prompt.
    pub fn focus(&self) -> &'static str {
        match self {
            Role::Radiologist => {
                "thoracic imaging: HRCT patterns, distribution, fibrosis signs and radiological differentials"
            }
            Role::Pathologist => {
                "histopathology: biopsy and cytology findings, and their correlation with imaging"
            }
            Role::Pulmonologist => {
                "respiratory medicine: symptoms, pulmonary function, disease behaviour and management"
            }
            Role::Rheumatologist => {
                "connective tissue disease: autoimmune serology, extrapulmonary features and immunosuppression"
            }
            Role::CaseOrganizer => "clinical record structuring",
            Role::Router => "consultation planning",
            Role::ConflictDetector => "cross-specialty consistency checking",
            Role::Discussion => "multidisciplinary consensus building",
            Role::Moderator => "multidisciplinary synthesis and communication",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    /// Parse a role name, ignoring case, surrounding whitespace, and `_`/`-`
    /// in place of spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        let role = match normalized.as_str() {
            "case organizer" | "organizer" => Role::CaseOrganizer,
            "moderator router" | "router" => Role::Router,
            "radiologist" => Role::Radiologist,
            "pathologist" => Role::Pathologist,
            "pulmonologist" => Role::Pulmonologist,
            "rheumatologist" => Role::Rheumatologist,
            "conflict detector" => Role::ConflictDetector,
            "team discussion" | "discussion" => Role::Discussion,
            "moderator" => Role::Moderator,
            _ => return Err(DomainError::UnknownRole(s.trim().to_string())),
        };
        Ok(role)
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Deduplicate a role list, keeping first occurrences in order.
pub fn dedup_roles(roles: &[Role]) -> Vec<Role> {
    let mut seen = Vec::with_capacity(roles.len());
    for role in roles {
        if !seen.contains(role) {
            seen.push(*role);
        }
    }
    seen
}
