//! REPL (Read-Eval-Print Loop) for interactive consultation

use crate::cli::commands::parse_model_override;
use crate::config::{OutputConfig, ReplConfig};
use crate::output::console::ConsoleFormatter;
use crate::round::{drive_round, print_outcome};
use colored::Colorize;
use mdt_application::{ConsultationSession, LlmGateway, Submission};
use mdt_domain::{Model, Role};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::collections::BTreeMap;

/// A slash command typed at the prompt
#[derive(Debug, Clone, PartialEq)]
enum ReplCommand {
    Quit,
    Help,
    ShowAgents,
    SetAgents(Vec<Role>),
    ResetAgents,
    ShowModels,
    SetModel(Role, Model),
    ResetModels,
    State,
    Summary,
}

fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let (name, arg) = line
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((line, ""));

    match (name, arg) {
        ("/quit" | "/exit" | "/q", _) => Ok(ReplCommand::Quit),
        ("/help" | "/h" | "/?", _) => Ok(ReplCommand::Help),
        ("/agents", "") => Ok(ReplCommand::ShowAgents),
        ("/agents", "all" | "reset") => Ok(ReplCommand::ResetAgents),
        ("/agents", list) => list
            .split(',')
            .map(|name| name.parse::<Role>().map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map(ReplCommand::SetAgents),
        ("/models", _) | ("/model", "") => Ok(ReplCommand::ShowModels),
        ("/model", "reset") => Ok(ReplCommand::ResetModels),
        ("/model", spec) => {
            let (role, model) = parse_model_override(spec)?;
            let role = role.parse::<Role>().map_err(|e| e.to_string())?;
            Ok(ReplCommand::SetModel(role, Model::from(model.as_str())))
        }
        ("/state", _) => Ok(ReplCommand::State),
        ("/summary", _) => Ok(ReplCommand::Summary),
        _ => Err(format!("Unknown command: {}", name)),
    }
}

/// Interactive consultation REPL
pub struct ChatRepl<G: LlmGateway + 'static> {
    session: ConsultationSession<G>,
    output: OutputConfig,
    repl: ReplConfig,
    agents: Option<Vec<Role>>,
    overrides: BTreeMap<Role, Model>,
}

impl<G: LlmGateway + 'static> ChatRepl<G> {
    /// Create a new ChatRepl
    pub fn new(session: ConsultationSession<G>) -> Self {
        Self {
            session,
            output: OutputConfig::default(),
            repl: ReplConfig::default(),
            agents: None,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn with_repl_config(mut self, repl: ReplConfig) -> Self {
        self.repl = repl;
        self
    }

    /// Roles for every round, instead of the session defaults
    pub fn with_agents(mut self, agents: Option<Vec<Role>>) -> Self {
        self.agents = agents;
        self
    }

    /// Model overrides applied to every round
    pub fn with_overrides(mut self, overrides: BTreeMap<Role, Model>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = self.repl.history_path();
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let prompt = format!("mdt[{}]> ", self.session.snapshot().await.round_count + 1);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    if line.starts_with('/') {
                        if self.handle_command(line).await {
                            break;
                        }
                        continue;
                    }

                    self.process_case(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│       MDT Consultation - Interactive        │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Session: {}", self.session.id());
        println!("Team:    {}", ConsoleFormatter::format_roles(&self.team()));
        println!();
        println!("Type case information or a follow-up question; each line is one round.");
        println!("Ctrl-C during a round stops it. Type /help for commands.");
        println!();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  /agents [ROLE, ROLE...|all]  - Show or set the team for next rounds");
        println!("  /model ROLE=MODEL            - Override a role's model");
        println!("  /model reset                 - Drop all model overrides");
        println!("  /models                      - Show model bindings");
        println!("  /summary                     - Show the current round report");
        println!("  /state                       - Dump the case state as JSON");
        println!("  /help, /h, /?                - Show this help");
        println!("  /quit, /exit, /q             - Exit");
        println!();
    }

    fn team(&self) -> Vec<Role> {
        self.agents
            .clone()
            .unwrap_or_else(|| self.session.params().enabled_roles.clone())
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&mut self, line: &str) -> bool {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message.red());
                println!("Type /help for available commands");
                return false;
            }
        };

        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => Self::print_help(),
            ReplCommand::ShowAgents => {
                println!("Team: {}", ConsoleFormatter::format_roles(&self.team()));
            }
            ReplCommand::SetAgents(roles) => {
                self.agents = Some(roles);
                println!("Team: {}", ConsoleFormatter::format_roles(&self.team()));
            }
            ReplCommand::ResetAgents => {
                self.agents = None;
                println!("Team: {}", ConsoleFormatter::format_roles(&self.team()));
            }
            ReplCommand::ShowModels => {
                let models = self.session.models().with_overrides(&self.overrides);
                println!();
                for role in Role::ALL {
                    let binding = models.binding(role);
                    let temperature = binding
                        .temperature
                        .map(|t| format!(" (temperature {})", t))
                        .unwrap_or_default();
                    println!("  {:<18} {}{}", role.as_str(), binding.model, temperature);
                }
                println!();
            }
            ReplCommand::SetModel(role, model) => {
                println!("{} -> {}", role, model);
                self.overrides.insert(role, model);
            }
            ReplCommand::ResetModels => {
                self.overrides.clear();
                println!("Model overrides cleared");
            }
            ReplCommand::State => {
                println!("{}", ConsoleFormatter::format_json(&self.session.snapshot().await));
            }
            ReplCommand::Summary => {
                println!("{}", ConsoleFormatter::format_report(&self.session.snapshot().await));
            }
        }
        false
    }

    async fn process_case(&self, text: &str) {
        println!();

        let submission = match Submission::new(text) {
            Ok(submission) => submission,
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        };
        let mut submission = match &self.agents {
            Some(roles) => submission.with_agents(roles.clone()),
            None => submission,
        };
        submission.model_configs = self.overrides.clone();

        match self.session.submit(submission).await {
            Ok(handle) => {
                let outcome = drive_round(handle, &self.output).await;
                print_outcome(&self.session.snapshot().await, &outcome, &self.output);
            }
            Err(e) => eprintln!("Error: {}", e),
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("/q"), Ok(ReplCommand::Quit));
        assert_eq!(parse_command("/help"), Ok(ReplCommand::Help));
        assert_eq!(parse_command("/agents"), Ok(ReplCommand::ShowAgents));
        assert_eq!(parse_command("/agents all"), Ok(ReplCommand::ResetAgents));
        assert_eq!(parse_command("/models"), Ok(ReplCommand::ShowModels));
        assert_eq!(parse_command("/state"), Ok(ReplCommand::State));
    }

    #[test]
    fn test_parse_agent_list() {
        assert_eq!(
            parse_command("/agents case organizer, radiologist,Moderator"),
            Ok(ReplCommand::SetAgents(vec![
                Role::CaseOrganizer,
                Role::Radiologist,
                Role::Moderator
            ]))
        );
        assert!(parse_command("/agents radiologist, dermatologist").is_err());
    }

    #[test]
    fn test_parse_model_override() {
        assert_eq!(
            parse_command("/model pulmonologist=gpt-5.1"),
            Ok(ReplCommand::SetModel(Role::Pulmonologist, Model::Gpt51))
        );
        assert_eq!(parse_command("/model reset"), Ok(ReplCommand::ResetModels));
        assert!(parse_command("/model nobody=gpt-5.1").is_err());
        assert!(parse_command("/model radiologist").is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_command("/frobnicate now"),
            Err("Unknown command: /frobnicate".to_string())
        );
    }
}
