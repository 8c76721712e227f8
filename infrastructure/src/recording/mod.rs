//! Round persistence.
//!
//! Provides [`JsonRoundRecorder`], a per-session JSON file writer that
//! implements the [`RoundRecorder`](mdt_application::RoundRecorder) port.

mod json_recorder;

pub use json_recorder::{JsonRoundRecorder, SessionFile, StoredRound};
