//! Case State aggregate and the per-field reducers that fold node output into it.
//!
//! - [`state::CaseState`] is the single mutable record of one consultation
//! - [`delta::StateDelta`] is what a workflow node returns
//! - [`chat::ChatMessage`] is one entry of the user-facing transcript

pub mod chat;
pub mod delta;
pub mod state;

pub use chat::ChatMessage;
pub use delta::StateDelta;
pub use state::CaseState;
