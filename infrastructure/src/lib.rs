//! Infrastructure layer for mdt-consult
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod openai;
pub mod recording;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, FileConfig, FileConsultationConfig, FileModelsConfig,
    FileOutputConfig, FileProviderConfig, FileReplConfig,
};
pub use openai::{
    endpoints::{Endpoint, EndpointRegistry},
    gateway::{GatewaySettings, OpenAiGateway},
};
pub use recording::JsonRoundRecorder;
