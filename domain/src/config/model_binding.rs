//! Per-role model bindings.
//!
//! [`RoleModels`] maps each consultation role to the model (and optional
//! temperature) it runs on. It is built once from configuration and can be
//! overridden per submission without mutating the original.

use crate::core::model::Model;
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The model a role runs on, plus an optional sampling temperature.
///
/// `temperature: None` means "use the provider default"; there is no
/// sentinel value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBinding {
    pub model: Model,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ModelBinding {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl From<Model> for ModelBinding {
    fn from(model: Model) -> Self {
        Self::new(model)
    }
}

/// Role → model binding table.
///
/// # Example
///
/// ```
/// use mdt_domain::{Model, Role, RoleModels};
///
/// let models = RoleModels::default();
/// assert_eq!(models.binding(Role::Pulmonologist).model, Model::Grok4);
/// // The router reasons with the moderator's model unless bound explicitly
/// assert_eq!(models.binding(Role::Router).model, Model::Gpt51);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RoleModels {
    bindings: BTreeMap<Role, ModelBinding>,
    fallback: ModelBinding,
}

impl Default for RoleModels {
    fn default() -> Self {
        let bindings = [
            (Role::CaseOrganizer, Model::DeepSeekV3),
            (Role::Moderator, Model::Gpt51),
            (Role::Radiologist, Model::ClaudeHaiku45),
            (Role::Pathologist, Model::Gemini25Pro),
            (Role::Pulmonologist, Model::Grok4),
            (Role::Rheumatologist, Model::Qwen3),
        ]
        .into_iter()
        .map(|(role, model)| (role, ModelBinding::new(model)))
        .collect();

        Self {
            bindings,
            fallback: ModelBinding::new(Model::DeepSeekV3),
        }
    }
}

impl RoleModels {
    /// An empty table where every role resolves to `fallback`.
    pub fn uniform(fallback: ModelBinding) -> Self {
        Self {
            bindings: BTreeMap::new(),
            fallback,
        }
    }

    /// Binding for a role.
    ///
    /// Unbound roles fall back to the table default, except the router which
    /// follows the moderator's binding when it has none of its own.
    pub fn binding(&self, role: Role) -> &ModelBinding {
        if let Some(binding) = self.bindings.get(&role) {
            return binding;
        }
        if role == Role::Router
            && let Some(binding) = self.bindings.get(&Role::Moderator)
        {
            return binding;
        }
        &self.fallback
    }

    pub fn model(&self, role: Role) -> &Model {
        &self.binding(role).model
    }

    pub fn set(&mut self, role: Role, binding: ModelBinding) {
        self.bindings.insert(role, binding);
    }

    pub fn with(mut self, role: Role, binding: impl Into<ModelBinding>) -> Self {
        self.set(role, binding.into());
        self
    }

    pub fn set_fallback(&mut self, binding: ModelBinding) {
        self.fallback = binding;
    }

    pub fn fallback(&self) -> &ModelBinding {
        &self.fallback
    }

    /// Apply per-submission model overrides.
    ///
    /// Only the model changes; a temperature configured for the role is kept.
    pub fn with_overrides(&self, overrides: &BTreeMap<Role, Model>) -> Self {
        let mut merged = self.clone();
        for (role, model) in overrides {
            let temperature = self.binding(*role).temperature;
            merged.set(
                *role,
                ModelBinding {
                    model: model.clone(),
                    temperature,
                },
            );
        }
        merged
    }

    /// Explicitly bound roles.
    pub fn iter(&self) -> impl Iterator<Item = (&Role, &ModelBinding)> {
        self.bindings.iter()
    }
}
