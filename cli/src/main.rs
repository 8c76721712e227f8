//! CLI entrypoint for mdt-consult
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use mdt_application::{
    ConsultationSession, NoRoundRecorder, RoundOutcome, RoundRecorder, Submission,
};
use mdt_domain::{Model, Role};
use mdt_infrastructure::{ConfigLoader, FileConfig, JsonRoundRecorder, OpenAiGateway};
use mdt_presentation::{ChatRepl, Cli, OutputConfig, ReplConfig, drive_round, print_outcome};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    // Held until exit so buffered log lines are flushed
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting mdt-consult");

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        let (config, warnings) = ConfigLoader::load_validated(cli.config.as_deref())?;
        for issue in &warnings {
            warn!("{}", issue);
        }
        config
    };

    let (models, _) = config.models.to_role_models();
    let (params, _) = config.consultation.to_params();

    let output = OutputConfig {
        format: cli.output_format().or(config.output.format).unwrap_or_default(),
        color: config.output.color,
        show_progress: !cli.quiet && config.repl.show_progress,
    };
    output.apply_color();

    // === Dependency Injection ===
    let gateway = Arc::new(OpenAiGateway::new(
        config.provider.to_endpoints(),
        config.provider.gateway_settings(),
    )?);
    let recorder = build_recorder(&config, cli.no_record);

    let session_id = Uuid::new_v4().to_string();
    info!("Session {}", session_id);
    let session = ConsultationSession::new(session_id, gateway, recorder, params, models);

    // Chat mode
    if cli.chat {
        let agents = cli
            .selected_agents()
            .map(|names| names.iter().map(|n| n.parse::<Role>()).collect::<Result<Vec<_>, _>>())
            .transpose()?;
        let overrides = cli
            .model_overrides()
            .into_iter()
            .map(|(role, model)| Ok((role.parse::<Role>()?, Model::from(model.as_str()))))
            .collect::<Result<BTreeMap<_, _>>>()?;

        let mut repl = ChatRepl::new(session)
            .with_output(output)
            .with_repl_config(ReplConfig {
                history_file: config.repl.history_path(),
            })
            .with_agents(agents)
            .with_overrides(overrides);

        repl.run().await?;
        return Ok(());
    }

    // One-shot mode - case text is required
    let Some(case_text) = cli.case_text.clone() else {
        bail!("Case text is required. Use --chat for interactive mode.");
    };

    let submission =
        Submission::from_names(case_text, cli.selected_agents(), &cli.model_overrides())?;
    let handle = session.submit(submission).await?;
    let outcome = drive_round(handle, &output).await;
    print_outcome(&session.snapshot().await, &outcome, &output);

    match outcome {
        RoundOutcome::Completed | RoundOutcome::Cancelled => Ok(()),
        RoundOutcome::Failed(reason) => bail!("Consultation failed: {}", reason),
    }
}

/// Initialize logging based on verbosity level.
///
/// With `--log-file`, diagnostics go to the file through a non-blocking
/// writer so they never interleave with streamed tokens.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn build_recorder(config: &FileConfig, disabled: bool) -> Arc<dyn RoundRecorder> {
    if disabled {
        return Arc::new(NoRoundRecorder);
    }
    match config.consultation.sessions_path() {
        Some(dir) => {
            info!("Recording rounds to {}", dir.display());
            Arc::new(JsonRoundRecorder::new(dir))
        }
        None => {
            warn!("No data directory found, rounds will not be recorded");
            Arc::new(NoRoundRecorder)
        }
    }
}
