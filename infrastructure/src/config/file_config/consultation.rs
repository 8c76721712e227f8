//! Consultation configuration from TOML (`[consultation]` section)

use super::expand_home;
use crate::recording::JsonRoundRecorder;
use mdt_application::ConsultationParams;
use mdt_domain::{ConfigIssue, ConfigIssueCode, Role};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw consultation configuration from TOML
///
/// # Example
///
/// ```toml
/// [consultation]
/// enabled_roles = ["Case Organizer", "Radiologist", "Pulmonologist", "Moderator"]
/// event_capacity = 256
/// record_specialist_turns = true
/// sessions_dir = "~/.local/share/mdt-consult/sessions"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsultationConfig {
    /// Roles taking part; `None` keeps the built-in team
    pub enabled_roles: Option<Vec<String>>,
    pub event_capacity: usize,
    pub record_specialist_turns: bool,
    /// Directory of the round recorder; `None` uses the platform data dir
    pub sessions_dir: Option<String>,
}

impl Default for FileConsultationConfig {
    fn default() -> Self {
        let params = ConsultationParams::default();
        Self {
            enabled_roles: None,
            event_capacity: params.event_capacity,
            record_specialist_turns: params.record_specialist_turns,
            sessions_dir: None,
        }
    }
}

impl FileConsultationConfig {
    /// Directory for the round recorder, `~` expanded.
    pub fn sessions_path(&self) -> Option<PathBuf> {
        match &self.sessions_dir {
            Some(dir) => Some(expand_home(dir)),
            None => JsonRoundRecorder::default_dir(),
        }
    }

    /// Convert to execution parameters, collecting issues.
    ///
    /// Unknown role names are reported and skipped. A zero event capacity is
    /// reported and replaced with the default.
    pub fn to_params(&self) -> (ConsultationParams, Vec<ConfigIssue>) {
        let mut params = ConsultationParams::default()
            .with_record_specialist_turns(self.record_specialist_turns);
        let mut issues = Vec::new();

        if let Some(names) = &self.enabled_roles {
            let mut roles = Vec::new();
            for name in names {
                match name.parse::<Role>() {
                    Ok(role) => roles.push(role),
                    Err(_) => issues.push(ConfigIssue::error(
                        ConfigIssueCode::UnknownRole,
                        format!("consultation.enabled_roles: unknown role '{}'", name),
                    )),
                }
            }
            params = params.with_enabled_roles(roles);
        }

        if self.event_capacity == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroEventCapacity,
                "consultation.event_capacity: must be at least 1",
            ));
        } else {
            params = params.with_event_capacity(self.event_capacity);
        }

        if params.is_moderated() && params.enabled_specialists().is_empty() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::NoSpecialists,
                "consultation.enabled_roles: no specialist enabled, the moderator will work alone",
            ));
        }

        (params, issues)
    }
}
