//! Output format value object

use serde::{Deserialize, Serialize};

/// How a finished round is rendered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every stage streamed as it runs (default)
    Transcript,
    /// Only the moderator's reply
    Reply,
    /// The final Case State as JSON
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Transcript
    }
}

impl OutputFormat {
    /// Whether intermediate stage output is shown while the round runs.
    pub fn streams_stages(&self) -> bool {
        matches!(self, OutputFormat::Transcript)
    }
}
