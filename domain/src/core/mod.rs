//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: model identifiers (presets plus custom names)
//! - [`case_text::CaseText`]: validated free-text case input for one round
//! - [`error::DomainError`]: domain-level errors
//! - [`text`]: string helpers for model output handling

pub mod case_text;
pub mod error;
pub mod model;
pub mod text;
