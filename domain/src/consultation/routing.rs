//! Router decision parsing.

use crate::core::text::strip_code_fences;
use crate::role::{Role, dedup_roles};
use serde_json::Value;

/// Specialist selected when the router's answer is unusable.
pub const DEFAULT_ROUTE: Role = Role::Pulmonologist;

/// Outcome of interpreting the router's answer against the enabled roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    /// Specialists to activate this round, in the router's order.
    pub selected: Vec<Role>,
    /// Why the fallback was used, if it was.
    pub anomaly: Option<String>,
}

impl RoutingDecision {
    /// Interpret the raw router answer.
    ///
    /// The answer must be a JSON list of role names. Names outside
    /// `enabled` (or that are not specialists) are dropped. A parse failure,
    /// a non-list, or a list that leaves nothing selected falls back to
    /// [`fallback`](Self::fallback).
    pub fn from_response(response: &str, enabled: &[Role]) -> Self {
        let candidates = Self::candidates(enabled);
        if candidates.is_empty() {
            return Self {
                selected: Vec::new(),
                anomaly: None,
            };
        }

        let parsed: Value = match serde_json::from_str(strip_code_fences(response)) {
            Ok(value) => value,
            Err(e) => return Self::fallback(enabled, format!("router output is not JSON: {}", e)),
        };

        let Value::Array(items) = parsed else {
            return Self::fallback(enabled, "router output is not a list");
        };

        let roles: Vec<Role> = items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|name| name.parse::<Role>().ok())
            .filter(|role| candidates.contains(role))
            .collect();

        if roles.is_empty() {
            return Self::fallback(enabled, "router selected no enabled specialist");
        }

        Self {
            selected: dedup_roles(&roles),
            anomaly: None,
        }
    }

    /// The fixed default selection.
    ///
    /// [`DEFAULT_ROUTE`] when it is enabled, otherwise the first enabled
    /// specialist in catalogue order, otherwise nothing.
    pub fn fallback(enabled: &[Role], reason: impl Into<String>) -> Self {
        let candidates = Self::candidates(enabled);
        let selected = if candidates.contains(&DEFAULT_ROUTE) {
            vec![DEFAULT_ROUTE]
        } else {
            candidates.into_iter().take(1).collect()
        };
        Self {
            selected,
            anomaly: Some(reason.into()),
        }
    }

    /// Enabled specialists in catalogue order.
    pub fn candidates(enabled: &[Role]) -> Vec<Role> {
        Role::SPECIALISTS
            .into_iter()
            .filter(|role| enabled.contains(role))
            .collect()
    }

    pub fn is_fallback(&self) -> bool {
        self.anomaly.is_some()
    }
}
