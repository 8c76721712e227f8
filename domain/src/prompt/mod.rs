//! Prompt domain
//!
//! Templates for every stage of a consultation round. The wording is opaque
//! to the workflow; only the data each template weaves in matters.

mod template;

pub use template::PromptTemplate;
