//! Domain layer for mdt-consult
//!
//! This crate contains the consultation's entities, value objects and pure
//! rules. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Case State
//!
//! One consultation session owns a single [`CaseState`]. Workflow nodes never
//! touch it directly: each returns a [`StateDelta`] that the executor folds in
//! with fixed per-field reducers (replace, shallow merge, append).
//!
//! ## Roles
//!
//! The team is a closed set of [`Role`]s: a case organizer, a router, four
//! specialists, a conflict detector, a discussion chair and a moderator.

pub mod case;
pub mod config;
pub mod consultation;
pub mod core;
pub mod prompt;
pub mod role;
pub mod session;

// Re-export commonly used types
pub use case::{CaseState, ChatMessage, StateDelta};
pub use config::{ConfigIssue, ConfigIssueCode, ModelBinding, OutputFormat, RoleModels, Severity};
pub use consultation::{
    Conflict, ConflictSeverity, DEFAULT_ROUTE, RoutingDecision, StructuredCase, parse_conflicts,
    parse_structuring,
};
pub use core::{case_text::CaseText, error::DomainError, model::Model};
pub use prompt::PromptTemplate;
pub use role::{AgentStatus, Role, dedup_roles};
pub use session::{
    entities::{Message, MessageRole},
    options::GenerationOptions,
    stream::StreamEvent,
};
