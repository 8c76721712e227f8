//! Round driver
//!
//! Drains a round's event stream to the terminal and turns Ctrl-C into the
//! round's cancellation signal.

use crate::config::OutputConfig;
use crate::output::console::ConsoleFormatter;
use crate::output::transcript::TranscriptPrinter;
use crate::progress::reporter::{NoProgress, RoundProgress, StatusBoard};
use colored::Colorize;
use mdt_application::{ConsultationEvent, RoundHandle, RoundOutcome};
use mdt_domain::{CaseState, OutputFormat};
use std::io::Write;
use tracing::warn;

/// Terminal view of a running round
pub struct RoundView {
    printer: TranscriptPrinter,
    progress: Box<dyn RoundProgress>,
}

impl RoundView {
    pub fn new(output: &OutputConfig) -> Self {
        // Transcript mode prints status inline instead
        let board = output.show_progress && !output.format.streams_stages();
        let progress: Box<dyn RoundProgress> = if board {
            Box::new(StatusBoard::new())
        } else {
            Box::new(NoProgress)
        };
        Self {
            printer: TranscriptPrinter::new(output.format, output.show_progress),
            progress,
        }
    }

    pub fn handle(&mut self, event: &ConsultationEvent) {
        if let ConsultationEvent::Status { role, status } = event {
            self.progress.on_status(*role, *status);
        }
        if event.is_terminal() {
            self.progress.finish();
        }
        if let Some(text) = self.printer.render(event) {
            print!("{}", text);
            let _ = std::io::stdout().flush();
        }
    }

    fn notice(&mut self, text: &str) {
        eprintln!("\n{}", text.yellow());
    }
}

/// Run a round to completion, rendering its events.
///
/// The first Ctrl-C cancels the round; the driver keeps draining until the
/// terminal event so every merged stage stays visible.
pub async fn drive_round(mut handle: RoundHandle, output: &OutputConfig) -> RoundOutcome {
    let mut view = RoundView::new(output);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = handle.events.recv() => match event {
                Some(event) => view.handle(&event),
                None => break,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                handle.cancel.cancel();
                view.notice("Stopping the round...");
            }
        }
    }

    match handle.completion.await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Round task failed: {}", e);
            RoundOutcome::Failed(e.to_string())
        }
    }
}

/// Print what the chosen output format shows once a round is over.
pub fn print_outcome(state: &CaseState, outcome: &RoundOutcome, output: &OutputConfig) {
    match output.format {
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(state)),
        OutputFormat::Reply | OutputFormat::Transcript => {}
    }

    match outcome {
        RoundOutcome::Completed => {
            if output.format.streams_stages() {
                eprintln!("{}", format!("Round {} complete.", state.round_count).green());
            }
        }
        RoundOutcome::Cancelled => {
            eprintln!("{}", format!("Round {} stopped by user.", state.round_count).yellow())
        }
        RoundOutcome::Failed(reason) => eprintln!(
            "{} {}",
            format!("Round {} failed:", state.round_count).red().bold(),
            reason
        ),
    }
}
