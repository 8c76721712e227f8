//! Provider configuration from TOML (`[provider]` section)

use crate::openai::endpoints::{Endpoint, EndpointRegistry};
use crate::openai::gateway::GatewaySettings;
use mdt_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Name of the endpoint built from the top-level `[provider]` keys
pub const DEFAULT_ENDPOINT: &str = "default";

/// Default OpenAI-compatible endpoint plus any extra named endpoints.
///
/// # Example
///
/// ```toml
/// [provider]
/// base_url = "https://api.openai.com/v1"
/// api_key_env = "OPENAI_API_KEY"
/// max_tokens = 4096
///
/// [provider.endpoints.xai]
/// base_url = "https://api.x.ai/v1"
/// api_key_env = "XAI_API_KEY"
///
/// [provider.routing]
/// "grok-4" = "xai"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Base URL of the default endpoint
    pub base_url: String,
    /// Environment variable holding the API key (default: "OPENAI_API_KEY")
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead)
    pub api_key: Option<String>,
    /// Cap on generated tokens per call
    pub max_tokens: Option<u32>,
    /// Time limit for one non-streaming call
    pub request_timeout_secs: u64,
    /// Additional named endpoints
    pub endpoints: BTreeMap<String, FileEndpointConfig>,
    /// Model identifier → endpoint name
    pub routing: BTreeMap<String, String>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            max_tokens: None,
            request_timeout_secs: 300,
            endpoints: BTreeMap::new(),
            routing: BTreeMap::new(),
        }
    }
}

impl FileProviderConfig {
    /// API key of the default endpoint: inline key first, then the env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), Some(&self.api_key_env))
    }

    /// Build the endpoint registry. Keys are resolved from the environment now.
    pub fn to_endpoints(&self) -> EndpointRegistry {
        let default = Endpoint::new(DEFAULT_ENDPOINT, self.base_url.clone())
            .with_api_key(self.resolve_api_key());
        let mut registry = EndpointRegistry::new(default);
        for (name, endpoint) in &self.endpoints {
            registry = registry.with_endpoint(
                Endpoint::new(name.clone(), endpoint.base_url.clone())
                    .with_api_key(endpoint.resolve_api_key()),
            );
        }
        for (model, endpoint) in &self.routing {
            registry = registry.with_route(model.clone(), endpoint.clone());
        }
        registry
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            max_tokens: self.max_tokens,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (model, endpoint) in &self.routing {
            if endpoint != DEFAULT_ENDPOINT && !self.endpoints.contains_key(endpoint) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownEndpoint,
                    format!(
                        "provider.routing.{}: endpoint '{}' is not defined in [provider.endpoints]",
                        model, endpoint
                    ),
                ));
            }
        }
        if self.resolve_api_key().is_none() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::MissingApiKey,
                format!(
                    "provider: no API key (set {} or provider.api_key)",
                    self.api_key_env
                ),
            ));
        }
        issues
    }
}

/// One extra OpenAI-compatible endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEndpointConfig {
    pub base_url: String,
    pub api_key_env: Option<String>,
    pub api_key: Option<String>,
}

impl FileEndpointConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), self.api_key_env.as_deref())
    }
}

fn resolve_key(inline: Option<&str>, env: Option<&str>) -> Option<String> {
    inline
        .filter(|key| !key.trim().is_empty())
        .map(str::to_string)
        .or_else(|| env.and_then(|name| std::env::var(name).ok()))
        .filter(|key| !key.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_key_wins() {
        let config = FileProviderConfig {
            api_key: Some("inline".into()),
            api_key_env: "MDT_TEST_SURELY_UNSET_KEY".into(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("inline"));
    }

    #[test]
    fn test_routing_to_unknown_endpoint_is_error() {
        let mut config = FileProviderConfig {
            api_key: Some("k".into()),
            ..Default::default()
        };
        config.routing.insert("grok-4".into(), "xai".into());
        config.routing.insert("gpt-5.1".into(), DEFAULT_ENDPOINT.into());
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::UnknownEndpoint);
    }

    #[test]
    fn test_to_endpoints_routes_models() {
        let mut config = FileProviderConfig {
            api_key: Some("k".into()),
            ..Default::default()
        };
        config.endpoints.insert(
            "xai".into(),
            FileEndpointConfig {
                base_url: "https://api.x.ai/v1".into(),
                api_key: Some("xai-key".into()),
                ..Default::default()
            },
        );
        config.routing.insert("grok-4".into(), "xai".into());

        let registry = config.to_endpoints();
        let grok = registry.resolve(&mdt_domain::Model::Grok4);
        assert_eq!(grok.base_url, "https://api.x.ai/v1");
        assert_eq!(grok.api_key(), Some("xai-key"));
        assert_eq!(registry.resolve(&mdt_domain::Model::Gpt51).name, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_missing_key_is_none() {
        let endpoint = FileEndpointConfig {
            base_url: "http://localhost:8000/v1".into(),
            api_key_env: Some("MDT_TEST_SURELY_UNSET_KEY".into()),
            api_key: Some(" ".into()),
        };
        assert_eq!(endpoint.resolve_api_key(), None);
    }
}
