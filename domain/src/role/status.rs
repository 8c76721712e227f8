//! Agent execution status

use serde::{Deserialize, Serialize};

/// Execution status of one role, as shown on a status board.
///
/// `idle → working → done` for ordinary nodes; the router passes through
/// `planning` instead of `working`. Roles not enabled for the session are
/// `offline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Working,
    Done,
    Offline,
    Planning,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Working => "working",
            AgentStatus::Done => "done",
            AgentStatus::Offline => "offline",
            AgentStatus::Planning => "planning",
        }
    }

    /// Whether the role is currently running.
    pub fn is_active(&self) -> bool {
        matches!(self, AgentStatus::Working | AgentStatus::Planning)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AgentStatus::Planning).unwrap(),
            "\"planning\""
        );
        let status: AgentStatus = serde_json::from_str("\"offline\"").unwrap();
        assert_eq!(status, AgentStatus::Offline);
    }

    #[test]
    fn test_is_active() {
        assert!(AgentStatus::Working.is_active());
        assert!(AgentStatus::Planning.is_active());
        assert!(!AgentStatus::Done.is_active());
    }
}
