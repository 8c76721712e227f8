//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod consultation_event;
pub mod llm_gateway;
pub mod round_recorder;
