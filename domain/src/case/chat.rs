//! Transcript entries.

use crate::core::model::Model;
use crate::role::Role;
use serde::{Deserialize, Serialize};

/// Speaker label used for user turns.
pub const USER_SPEAKER: &str = "user";

/// One entry of the user-facing transcript.
///
/// `role` is the speaker label: [`USER_SPEAKER`] for the user, otherwise a
/// role's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: USER_SPEAKER.to_string(),
            content: content.into(),
            model: None,
        }
    }

    pub fn from_role(role: Role, content: impl Into<String>, model: Option<&Model>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: content.into(),
            model: model.map(|m| m.to_string()),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == USER_SPEAKER
    }

    pub fn is_from(&self, role: Role) -> bool {
        self.role == role.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speakers() {
        let user = ChatMessage::user("cough for 3 months");
        assert!(user.is_user());
        assert_eq!(user.model, None);

        let reply = ChatMessage::from_role(Role::Moderator, "plan", Some(&Model::Gpt51));
        assert!(reply.is_from(Role::Moderator));
        assert_eq!(reply.role, "Moderator");
        assert_eq!(reply.model.as_deref(), Some("gpt-5.1"));
    }

    #[test]
    fn test_model_omitted_from_json() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
