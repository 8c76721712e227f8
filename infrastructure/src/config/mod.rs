//! Configuration file loading for mdt-consult
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MDT_` environment variables (`MDT_PROVIDER__BASE_URL`, ...)
//! 2. `--config <path>` specified file
//! 3. Project root: `./mdt.toml` or `./.mdt.toml`
//! 4. Global: `$XDG_CONFIG_HOME/mdt-consult/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    DEFAULT_ENDPOINT, FileConfig, FileConsultationConfig, FileEndpointConfig, FileModelEntry,
    FileModelsConfig, FileOutputConfig, FileProviderConfig, FileReplConfig, expand_home,
};
pub use loader::{ConfigError, ConfigLoader};
