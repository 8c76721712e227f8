//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to domain and application
//! types on demand.

mod consultation;
mod models;
mod output;
mod provider;
mod repl;

pub use consultation::FileConsultationConfig;
pub use models::{FileModelEntry, FileModelsConfig};
pub use output::FileOutputConfig;
pub use provider::{DEFAULT_ENDPOINT, FileEndpointConfig, FileProviderConfig};
pub use repl::FileReplConfig;

use mdt_domain::ConfigIssue;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Generation endpoints and credentials
    pub provider: FileProviderConfig,
    /// Per-role model bindings
    pub models: FileModelsConfig,
    /// Team composition and round execution
    pub consultation: FileConsultationConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// REPL settings
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks model bindings (empty names, unknown roles, temperatures),
    /// consultation parameters (unknown roles, event capacity, empty team)
    /// and provider routing.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.models.to_role_models().1);
        issues.extend(self.consultation.to_params().1);
        issues.extend(self.provider.validate());
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdt_domain::{ConfigIssueCode, Model, OutputFormat, Role};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[provider]
base_url = "http://localhost:8000/v1"
api_key = "sk-local"
max_tokens = 2048

[provider.endpoints.xai]
base_url = "https://api.x.ai/v1"
api_key_env = "XAI_API_KEY"

[provider.routing]
"grok-4" = "xai"

[models]
default = "deepseek-v3-2-exp"
radiologist = "gpt-5.1"
moderator = { model = "grok-4", temperature = 0.3 }

[consultation]
enabled_roles = ["Case Organizer", "Radiologist", "Moderator"]
event_capacity = 64
record_specialist_turns = false

[output]
format = "json"
color = false

[repl]
show_progress = false
history_file = "~/.local/share/mdt-consult/history.txt"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_empty());

        assert_eq!(config.provider.max_tokens, Some(2048));
        assert_eq!(config.provider.routing["grok-4"], "xai");

        let (models, _) = config.models.to_role_models();
        assert_eq!(models.model(Role::Radiologist), &Model::Gpt51);
        assert_eq!(models.binding(Role::Moderator).temperature, Some(0.3));

        let (params, _) = config.consultation.to_params();
        assert_eq!(params.event_capacity, 64);
        assert!(!params.record_specialist_turns);
        assert!(!params.is_enabled(Role::Pathologist));

        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.output.color);
        assert!(!config.repl.show_progress);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[models]
pulmonologist = "qwen3-235b-a22b"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.models.to_role_models().0.model(Role::Pulmonologist),
            &Model::Qwen3
        );
        // Defaults should apply
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(config.consultation.event_capacity, 256);
        assert!(config.output.color);
        assert!(config.repl.show_progress);
    }

    #[test]
    fn test_validate_collects_across_sections() {
        let toml_str = r#"
[provider]
api_key = "sk"

[provider.routing]
"grok-4" = "nowhere"

[models]
radiologist = ""

[consultation]
event_capacity = 0
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let codes: Vec<_> = config.validate().iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                ConfigIssueCode::EmptyModel,
                ConfigIssueCode::ZeroEventCapacity,
                ConfigIssueCode::UnknownEndpoint
            ]
        );
        assert!(ConfigIssue::has_errors(&config.validate()));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/lib/mdt"), PathBuf::from("/var/lib/mdt"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/mdt/sessions"), home.join("mdt/sessions"));
        }
    }

    #[test]
    fn test_default_config_has_no_errors() {
        let config = FileConfig::default();
        // Only a missing-key warning is possible, depending on the environment
        assert!(!ConfigIssue::has_errors(&config.validate()));
    }
}
