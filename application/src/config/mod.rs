//! Application-level configuration.
//!
//! - [`ConsultationParams`]: which roles run and how the round is driven

pub mod consultation_params;

pub use consultation_params::ConsultationParams;
