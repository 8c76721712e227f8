//! Role-based model configuration from TOML (`[models]` section)

use mdt_domain::{ConfigIssue, ConfigIssueCode, Model, ModelBinding, Role, RoleModels};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role-based model configuration from TOML
///
/// Keys are role names (any spelling `Role` accepts) or `default`, which
/// replaces the fallback binding. Values are a model name or a table.
///
/// # Example
///
/// ```toml
/// [models]
/// default = "deepseek-v3-2-exp"
/// radiologist = "claude-haiku-4-5-20251001"
/// moderator = { model = "gpt-5.1", temperature = 0.2 }
/// case_organizer = "deepseek-v3-2-exp"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileModelsConfig {
    pub entries: BTreeMap<String, FileModelEntry>,
}

/// A bare model name or `{ model, temperature }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileModelEntry {
    Name(String),
    Table {
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f32>,
    },
}

impl FileModelEntry {
    fn model_name(&self) -> &str {
        match self {
            FileModelEntry::Name(name) => name,
            FileModelEntry::Table { model, .. } => model,
        }
    }

    fn temperature(&self) -> Option<f32> {
        match self {
            FileModelEntry::Name(_) => None,
            FileModelEntry::Table { temperature, .. } => *temperature,
        }
    }

    /// Parse into a binding, collecting issues for `field`.
    fn parse(&self, field: &str) -> (Option<ModelBinding>, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let name = self.model_name();
        if name.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyModel,
                format!("models.{}: model name cannot be empty", field),
            ));
            return (None, issues);
        }

        let mut binding = ModelBinding::new(Model::from(name));
        if let Some(temperature) = self.temperature() {
            if (0.0..=2.0).contains(&temperature) {
                binding = binding.with_temperature(temperature);
            } else {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::TemperatureOutOfRange,
                    format!(
                        "models.{}: temperature {} is outside 0.0..=2.0",
                        field, temperature
                    ),
                ));
            }
        }
        (Some(binding), issues)
    }
}

impl FileModelsConfig {
    /// Build the role binding table on top of the built-in presets.
    pub fn to_role_models(&self) -> (RoleModels, Vec<ConfigIssue>) {
        let mut models = RoleModels::default();
        let mut issues = Vec::new();

        for (key, entry) in &self.entries {
            let (binding, entry_issues) = entry.parse(key);
            issues.extend(entry_issues);
            let Some(binding) = binding else {
                continue;
            };

            if key.eq_ignore_ascii_case("default") {
                models.set_fallback(binding);
                continue;
            }
            match key.parse::<Role>() {
                Ok(role) => models.set(role, binding),
                Err(_) => issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownRole,
                    format!("models.{}: unknown role", key),
                )),
            }
        }

        (models, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> FileModelsConfig {
        #[derive(Deserialize)]
        struct Wrapper {
            models: FileModelsConfig,
        }
        toml::from_str::<Wrapper>(toml_str).unwrap().models
    }

    #[test]
    fn test_string_and_table_entries() {
        let config = parse(
            r#"
[models]
radiologist = "gpt-5.1"
moderator = { model = "grok-4", temperature = 0.2 }
"#,
        );
        let (models, issues) = config.to_role_models();
        assert!(issues.is_empty());
        assert_eq!(models.model(Role::Radiologist), &Model::Gpt51);
        assert_eq!(models.binding(Role::Moderator).model, Model::Grok4);
        assert_eq!(models.binding(Role::Moderator).temperature, Some(0.2));
        // Untouched roles keep their presets
        assert_eq!(models.model(Role::Pathologist), &Model::Gemini25Pro);
    }

    #[test]
    fn test_default_replaces_fallback() {
        let config = parse(
            r#"
[models]
default = "local-llama"
"#,
        );
        let (models, _) = config.to_role_models();
        assert_eq!(models.fallback().model, Model::Custom("local-llama".into()));
        assert_eq!(models.model(Role::ConflictDetector), &Model::Custom("local-llama".into()));
    }

    #[test]
    fn test_issues_are_collected() {
        let config = parse(
            r#"
[models]
dermatologist = "gpt-5.1"
radiologist = ""
pathologist = { model = "grok-4", temperature = 3.5 }
"#,
        );
        let (models, issues) = config.to_role_models();
        let codes: Vec<_> = issues.iter().map(|i| i.code).collect();
        assert!(codes.contains(&ConfigIssueCode::UnknownRole));
        assert!(codes.contains(&ConfigIssueCode::EmptyModel));
        assert!(codes.contains(&ConfigIssueCode::TemperatureOutOfRange));
        // Out-of-range temperature keeps the model, drops the temperature
        assert_eq!(models.binding(Role::Pathologist).temperature, None);
        assert_eq!(models.model(Role::Pathologist), &Model::Grok4);
        assert_eq!(models.model(Role::Radiologist), &Model::ClaudeHaiku45);
    }
}
