//! Generation call options.

use crate::config::ModelBinding;
use crate::core::model::Model;

/// Options for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: Model,
    /// `None` leaves the provider default in place.
    pub temperature: Option<f32>,
    /// Ask the provider for a strict JSON object answer.
    pub json_mode: bool,
    /// Deliver the answer token by token.
    pub stream: bool,
}

impl GenerationOptions {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            temperature: None,
            json_mode: false,
            stream: false,
        }
    }

    /// Options for a role binding, with an optional explicit temperature.
    ///
    /// Precedence: `explicit` if given, else the binding's temperature,
    /// else none (provider default).
    pub fn for_binding(binding: &ModelBinding, explicit: Option<f32>) -> Self {
        Self {
            model: binding.model.clone(),
            temperature: explicit.or(binding.temperature),
            json_mode: false,
            stream: false,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_precedence() {
        let bound = ModelBinding::new(Model::Grok4).with_temperature(0.7);
        assert_eq!(GenerationOptions::for_binding(&bound, Some(0.0)).temperature, Some(0.0));
        assert_eq!(GenerationOptions::for_binding(&bound, None).temperature, Some(0.7));

        let unbound = ModelBinding::new(Model::Grok4);
        assert_eq!(GenerationOptions::for_binding(&unbound, None).temperature, None);
    }

    #[test]
    fn test_builders() {
        let options = GenerationOptions::new(Model::Gpt51).json().streaming();
        assert!(options.json_mode);
        assert!(options.stream);
        assert_eq!(options.temperature, None);
    }
}
