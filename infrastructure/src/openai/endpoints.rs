//! Endpoint registry
//!
//! Every model is served by exactly one endpoint: the one named in the
//! routing table, or the default endpoint.

use mdt_domain::Model;
use std::collections::HashMap;
use tracing::warn;

/// One OpenAI-compatible endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Endpoint {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Model → endpoint resolution.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    default: Endpoint,
    named: HashMap<String, Endpoint>,
    routing: HashMap<String, String>,
}

impl EndpointRegistry {
    pub fn new(default: Endpoint) -> Self {
        Self {
            default,
            named: HashMap::new(),
            routing: HashMap::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.named.insert(endpoint.name.clone(), endpoint);
        self
    }

    /// Serve `model` from the endpoint called `endpoint`.
    pub fn with_route(mut self, model: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.routing.insert(model.into(), endpoint.into());
        self
    }

    pub fn default_endpoint(&self) -> &Endpoint {
        &self.default
    }

    pub fn resolve(&self, model: &Model) -> &Endpoint {
        let Some(name) = self.routing.get(model.as_str()) else {
            return &self.default;
        };
        if *name == self.default.name {
            return &self.default;
        }
        match self.named.get(name) {
            Some(endpoint) => endpoint,
            None => {
                warn!(
                    "Model {} routed to unknown endpoint '{}', using default",
                    model, name
                );
                &self.default
            }
        }
    }
}
