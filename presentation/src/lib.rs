//! Presentation layer for mdt-consult
//!
//! This crate contains CLI definitions, output formatters,
//! progress reporters, and the interactive consultation interface.

pub mod chat;
pub mod cli;
pub mod config;
pub mod output;
pub mod progress;
pub mod round;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use cli::commands::{Cli, OutputFormatArg};
pub use config::{OutputConfig, ReplConfig};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use output::transcript::TranscriptPrinter;
pub use progress::reporter::{NoProgress, RoundProgress, StatusBoard};
pub use round::{RoundView, drive_round, print_outcome};
