//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use mdt_domain::ConfigIssue;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PROJECT_FILES: [&str; 2] = ["mdt.toml", ".mdt.toml"];
const ENV_PREFIX: &str = "MDT_";

/// Errors that stop configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration:\n{}", format_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  {}", issue))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `MDT_`-prefixed environment variables, `__` separating sections
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./mdt.toml` or `./.mdt.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/mdt-consult/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        Self::figment(config_path).extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Load and validate.
    ///
    /// Returns the configuration plus its warnings, or every issue if any
    /// of them is an error.
    pub fn load_validated(
        config_path: Option<&Path>,
    ) -> Result<(FileConfig, Vec<ConfigIssue>), ConfigError> {
        let config = Self::load(config_path)?;
        let issues = config.validate();
        if ConfigIssue::has_errors(&issues) {
            return Err(ConfigError::Invalid(issues));
        }
        Ok((config, issues))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/mdt-consult/config.toml if set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mdt-consult").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");
        println!("  [     ] Env:     {}* variables", ENV_PREFIX);

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./mdt.toml or ./.mdt.toml");
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            println!("  [{}] Global:  {}", mark, path.display());
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdt_domain::{ConfigIssueCode, Model, Role};
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.models.entries.is_empty());
        assert!(config.consultation.record_specialist_turns);
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let file = write_config(
            r#"
[provider]
api_key = "sk-test"

[models]
rheumatologist = "gpt-5.1"
"#,
        );
        let config = ConfigLoader::load(Some(file.path())).unwrap();
        let (models, _) = config.models.to_role_models();
        assert_eq!(models.model(Role::Rheumatologist), &Model::Gpt51);
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.consultation.event_capacity, 256);
    }

    #[test]
    fn test_load_validated_rejects_errors() {
        let file = write_config(
            r#"
[consultation]
event_capacity = 0
"#,
        );
        match ConfigLoader::load_validated(Some(file.path())) {
            Err(ConfigError::Invalid(issues)) => {
                assert!(issues.iter().any(|i| i.code == ConfigIssueCode::ZeroEventCapacity));
            }
            other => panic!("expected invalid configuration, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let file = write_config("[consultation\nevent_capacity = ");
        assert!(matches!(
            ConfigLoader::load(Some(file.path())),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("mdt-consult"));
    }
}
