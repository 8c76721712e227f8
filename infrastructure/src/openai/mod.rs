//! OpenAI-compatible chat completions adapter
//!
//! Implements LlmGateway over HTTP for any endpoint that speaks the
//! `/chat/completions` protocol, with SSE token streaming.

pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod protocol;
pub mod sse;
