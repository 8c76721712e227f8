//! CLI command definitions

use clap::{Parser, ValueEnum};
use mdt_domain::OutputFormat;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Output format for consultation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// Every stage streamed as it runs
    Transcript,
    /// Only the moderator's reply
    Reply,
    /// The final case state as JSON
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Transcript => OutputFormat::Transcript,
            OutputFormatArg::Reply => OutputFormat::Reply,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for mdt-consult
#[derive(Parser, Debug)]
#[command(name = "mdt-consult")]
#[command(author, version, about = "Multidisciplinary team consultation with LLM specialists")]
#[command(long_about = r#"
mdt-consult runs a multidisciplinary team (MDT) consultation over a clinical case.

Each round:
1. The Case Organizer structures the case text into a digest
2. The moderator's router picks the specialists the round needs
3. Selected specialists analyse the case in parallel
4. Disagreements are detected and discussed
5. The moderator writes a synthesis and replies to the clinician

Configuration files are loaded from (in priority order):
1. MDT_* environment variables
2. --config <path>     Explicit config file
3. ./mdt.toml          Project-level config
4. ~/.config/mdt-consult/config.toml   Global config

Example:
  mdt-consult "62M, progressive dyspnoea, HRCT shows basal reticulation..."
  mdt-consult -a "Case Organizer" -a Radiologist -a Moderator "..."
  mdt-consult --model radiologist=gpt-5.1 --output reply "..."
  mdt-consult --chat
"#)]
pub struct Cli {
    /// The case text for the first round (not required in chat mode)
    pub case_text: Option<String>,

    /// Start interactive consultation mode (one round per line)
    #[arg(short, long)]
    pub chat: bool,

    /// Roles taking part (can be specified multiple times)
    #[arg(short, long = "agent", value_name = "ROLE")]
    pub agents: Vec<String>,

    /// Per-role model override, e.g. `radiologist=gpt-5.1` (repeatable)
    #[arg(short, long = "model", value_name = "ROLE=MODEL", value_parser = parse_model_override)]
    pub models: Vec<(String, String)>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormatArg>,

    /// Shorthand for `--output json`
    #[arg(long, conflicts_with = "output")]
    pub json: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Do not persist rounds to the sessions directory
    #[arg(long)]
    pub no_record: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Output format requested on the command line, if any.
    pub fn output_format(&self) -> Option<OutputFormat> {
        if self.json {
            return Some(OutputFormat::Json);
        }
        self.output.map(OutputFormat::from)
    }

    /// `--model` overrides keyed by role name.
    pub fn model_overrides(&self) -> BTreeMap<String, String> {
        self.models.iter().cloned().collect()
    }

    /// `--agent` selection, `None` when no agent was named.
    pub fn selected_agents(&self) -> Option<&[String]> {
        (!self.agents.is_empty()).then_some(self.agents.as_slice())
    }
}

/// Parse `ROLE=MODEL`.
pub fn parse_model_override(s: &str) -> Result<(String, String), String> {
    let (role, model) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ROLE=MODEL, got '{}'", s))?;
    let (role, model) = (role.trim(), model.trim());
    if role.is_empty() || model.is_empty() {
        return Err(format!("expected ROLE=MODEL, got '{}'", s));
    }
    Ok((role.to_string(), model.to_string()))
}
