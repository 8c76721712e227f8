//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod consultation_session;
pub mod run_round;
