//! Model value object representing an LLM model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// LLM model identifier (Value Object)
///
/// The presets are the models the consultation team is usually bound to.
/// Any other identifier an OpenAI-compatible endpoint accepts is carried
/// as [`Model::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    Gpt51,
    DeepSeekV3,
    ClaudeHaiku45,
    Gemini25Pro,
    Grok4,
    Qwen3,
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gpt51 => "gpt-5.1",
            Model::DeepSeekV3 => "deepseek-v3-2-exp",
            Model::ClaudeHaiku45 => "claude-haiku-4-5-20251001",
            Model::Gemini25Pro => "gemini-2.5-pro",
            Model::Grok4 => "grok-4",
            Model::Qwen3 => "qwen3-235b-a22b",
            Model::Custom(s) => s,
        }
    }

    /// All preset models, in the order they are offered to users
    pub fn presets() -> Vec<Model> {
        vec![
            Model::Gpt51,
            Model::DeepSeekV3,
            Model::ClaudeHaiku45,
            Model::Gemini25Pro,
            Model::Grok4,
            Model::Qwen3,
        ]
    }

    /// Check if this is one of the preset models
    pub fn is_preset(&self) -> bool {
        !matches!(self, Model::Custom(_))
    }
}

impl Default for Model {
    /// Returns the default model (DeepSeek V3)
    fn default() -> Self {
        Model::DeepSeekV3
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim() {
            "gpt-5.1" => Model::Gpt51,
            "deepseek-v3-2-exp" => Model::DeepSeekV3,
            "claude-haiku-4-5-20251001" => Model::ClaudeHaiku45,
            "gemini-2.5-pro" => Model::Gemini25Pro,
            "grok-4" => Model::Grok4,
            "qwen3-235b-a22b" => Model::Qwen3,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        let Ok(model) = s.parse();
        model
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s.as_str()))
    }
}
