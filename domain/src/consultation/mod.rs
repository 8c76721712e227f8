//! Consultation value objects and model-output parsing.
//!
//! These are pure functions over model text: no I/O, no sessions. Each
//! parser degrades to a deterministic value instead of failing, because a
//! malformed answer must never abort a round.
//!
//! | Module | Parses | Fallback |
//! |--------|--------|----------|
//! | [`conflict`] | conflict detector JSON | explanatory `info` record |
//! | [`routing`] | router role list | default specialist |
//! | [`structuring`] | organizer digest / update | caller keeps previous digest |

pub mod conflict;
pub mod routing;
pub mod structuring;

pub use conflict::{Conflict, ConflictSeverity, parse_conflicts};
pub use routing::{RoutingDecision, DEFAULT_ROUTE};
pub use structuring::{StructuredCase, parse_structuring};
