//! Run Round use case
//!
//! Executes one consultation round over the shared Case State:
//!
//! ```text
//! moderated:   [Case Organizer] → Router → fan-out(selected specialists)
//!              → Conflict Detector → Discussion → Moderator
//! unmoderated: [Case Organizer] → each enabled specialist, one after another
//! ```
//!
//! Nodes run on a snapshot of the state and return a [`StateDelta`]. Deltas
//! are merged one at a time by the executor, even when the specialists ran
//! concurrently. The event stream always ends with a single
//! [`ConsultationEvent::Done`].

mod conflict;
mod discussion;
mod generation;
mod moderator;
mod organizer;
mod router;
mod specialist;
#[cfg(test)]
pub(crate) mod test_support;
mod types;

pub use moderator::{REPLY_FAILED, SUMMARY_FAILED};
pub use organizer::Structuring;
pub use types::{Cancelled, RoleOutput, RoundOutcome};

use crate::config::ConsultationParams;
use crate::ports::consultation_event::{ConsultationEvent, EventSink};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::round_recorder::{NoRoundRecorder, RoundRecord, RoundRecorder};
use futures::FutureExt;
use mdt_domain::{AgentStatus, CaseState, Role, RoleModels, StateDelta};
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use types::{NodeContext, RoundStop};

/// Input for the RunRound use case
#[derive(Debug, Clone)]
pub struct RunRoundInput {
    /// Session the round belongs to, used as the recorder key
    pub session_id: String,
    /// Enabled roles and execution parameters for this round
    pub params: ConsultationParams,
    /// Model bindings for this round, overrides already applied
    pub models: RoleModels,
}

impl RunRoundInput {
    pub fn new(session_id: impl Into<String>, params: ConsultationParams, models: RoleModels) -> Self {
        Self {
            session_id: session_id.into(),
            params,
            models,
        }
    }
}

/// Use case for running one consultation round
pub struct RunRoundUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    recorder: Arc<dyn RoundRecorder>,
}

impl<G: LlmGateway + 'static> RunRoundUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            recorder: Arc::new(NoRoundRecorder),
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn RoundRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Execute one round.
    ///
    /// The caller must have recorded the user's input in `state` already.
    /// Returns once the round has ended and the terminal event was sent.
    pub async fn execute(
        &self,
        state: Arc<Mutex<CaseState>>,
        input: RunRoundInput,
        events: EventSink,
        cancel: CancellationToken,
    ) -> RoundOutcome {
        let executor = Executor {
            ctx: Arc::new(NodeContext {
                gateway: Arc::clone(&self.gateway),
                models: input.models,
                params: input.params,
                events: events.clone(),
                cancel,
            }),
            state: Arc::clone(&state),
        };

        let outcome = match AssertUnwindSafe(executor.run()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = format!("Round aborted: {}", panic_message(&*panic));
                error!("{}", message);
                events
                    .emit(ConsultationEvent::Error {
                        content: message.clone(),
                    })
                    .await;
                RoundOutcome::Failed(message)
            }
        };
        drop(executor);

        self.record(input.session_id, &state).await;
        events.emit(ConsultationEvent::Done).await;
        outcome
    }

    async fn record(&self, session_id: String, state: &Mutex<CaseState>) {
        let (round, record) = {
            let state = state.lock().await;
            (state.round_count, RoundRecord::from_state(&state))
        };
        let recorder = Arc::clone(&self.recorder);
        let id = session_id.clone();
        let written =
            tokio::task::spawn_blocking(move || recorder.append_round(&id, round, &record)).await;
        match written {
            Ok(Ok(())) => debug!("Recorded round {} of {}", round, session_id),
            Ok(Err(e)) => warn!("Failed to record round {} of {}: {}", round, session_id, e),
            Err(e) => warn!("Recorder task for round {} of {} failed: {}", round, session_id, e),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_string()
    }
}

/// Drives the nodes of one round and owns every merge into the state.
struct Executor<G: LlmGateway + 'static> {
    ctx: Arc<NodeContext<G>>,
    state: Arc<Mutex<CaseState>>,
}

impl<G: LlmGateway + 'static> Executor<G> {
    async fn run(&self) -> RoundOutcome {
        let round = {
            let mut state = self.state.lock().await;
            state.begin_round();
            state.round_count
        };
        let active = self.ctx.params.active_roles();
        info!("Starting round {} with {} active roles", round, active.len());

        self.seed_statuses(&active).await;

        if active.is_empty() {
            let message = "No agents enabled for this round".to_string();
            self.ctx.events.emit(ConsultationEvent::Error {
                content: message.clone(),
            })
            .await;
            return RoundOutcome::Failed(message);
        }

        let result = if self.ctx.params.is_moderated() {
            self.run_moderated().await
        } else {
            self.run_serial().await
        };

        match result {
            Ok(()) => {
                info!("Round {} complete", round);
                RoundOutcome::Completed
            }
            Err(RoundStop::Cancelled) => {
                info!("Round {} cancelled", round);
                self.log(format!("Round {} stopped by user", round)).await;
                RoundOutcome::Cancelled
            }
            Err(RoundStop::Failed(message)) => {
                error!("Round {} failed: {}", round, message);
                RoundOutcome::Failed(message)
            }
        }
    }

    async fn run_moderated(&self) -> Result<(), RoundStop> {
        if self.ctx.params.is_enabled(Role::CaseOrganizer) {
            self.run_stage(Role::CaseOrganizer).await?;
        }
        self.run_stage(Role::Router).await?;

        let selected = self.state.lock().await.selected_agents.clone();
        if selected.is_empty() {
            self.log("No specialist selected, skipping fan-out").await;
        } else {
            self.fan_out(&selected).await?;
        }

        self.run_stage(Role::ConflictDetector).await?;
        self.run_stage(Role::Discussion).await?;
        self.run_stage(Role::Moderator).await
    }

    async fn run_serial(&self) -> Result<(), RoundStop> {
        if self.ctx.params.is_enabled(Role::CaseOrganizer) {
            self.run_stage(Role::CaseOrganizer).await?;
        }
        for role in self.ctx.params.enabled_specialists() {
            self.run_stage(role).await?;
        }
        Ok(())
    }

    /// Run one node to completion on the current task.
    async fn run_stage(&self, role: Role) -> Result<(), RoundStop> {
        self.ctx.check_cancelled()?;
        let snapshot = self.start(role).await;
        let result = dispatch(&self.ctx, role, &snapshot).await;
        self.settle(role, result).await
    }

    /// Run the selected specialists concurrently.
    ///
    /// A specialist whose dependency is also selected starts only after the
    /// dependency's delta has been merged. Each result is merged as soon as
    /// its task returns.
    async fn fan_out(&self, selected: &[Role]) -> Result<(), RoundStop> {
        info!("Fan-out to {} specialists", selected.len());

        let mut pending: Vec<Role> = selected.to_vec();
        let mut finished: HashSet<Role> = HashSet::new();
        let mut join_set = JoinSet::new();
        let mut stop: Option<RoundStop> = None;

        loop {
            if stop.is_none() && !self.ctx.cancel.is_cancelled() {
                let (ready, blocked): (Vec<Role>, Vec<Role>) =
                    pending.into_iter().partition(|role| {
                        role.depends_on()
                            .iter()
                            .all(|dep| !selected.contains(dep) || finished.contains(dep))
                    });
                pending = blocked;

                for role in ready {
                    let snapshot = self.start(role).await;
                    let ctx = Arc::clone(&self.ctx);
                    join_set.spawn(async move {
                        let result = specialist::run_node(&ctx, role, &snapshot).await;
                        (role, result)
                    });
                }
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };

            match joined {
                Ok((role, result)) => match self.settle(role, result).await {
                    Ok(()) => {
                        finished.insert(role);
                    }
                    Err(reason) => {
                        stop.get_or_insert(reason);
                    }
                },
                Err(e) if e.is_cancelled() => {
                    debug!("Specialist task aborted");
                }
                Err(e) => {
                    let message = format!("Specialist task failed: {}", e);
                    error!("{}", message);
                    self.ctx.events.emit(ConsultationEvent::Error {
                        content: message.clone(),
                    })
                    .await;
                    join_set.abort_all();
                    stop.get_or_insert(RoundStop::Failed(message));
                }
            }
        }

        if let Some(reason) = stop {
            return Err(reason);
        }
        if !pending.is_empty() {
            debug!("{} specialists never started", pending.len());
        }
        self.ctx.check_cancelled()?;
        Ok(())
    }

    async fn seed_statuses(&self, active: &[Role]) {
        let statuses = CaseState::initial_statuses(active);
        self.state.lock().await.apply(StateDelta {
            agent_status: statuses.clone(),
            ..StateDelta::default()
        });
        for (role, status) in statuses {
            self.ctx.events.status(role, status).await;
        }
    }

    /// Mark a node as running and take its snapshot.
    async fn start(&self, role: Role) -> CaseState {
        let status = if role == Role::Router {
            AgentStatus::Planning
        } else {
            AgentStatus::Working
        };
        let line = format!("[{}] started (model: {})", role, self.ctx.model(role));

        let snapshot = {
            let mut state = self.state.lock().await;
            state.apply(
                StateDelta::new()
                    .with_status(role, status)
                    .with_log(line.clone()),
            );
            state.clone()
        };

        self.ctx.events.status(role, status).await;
        self.ctx.events.log(line).await;
        snapshot
    }

    /// Merge a node's result and report it.
    async fn settle(&self, role: Role, result: Result<StateDelta, Cancelled>) -> Result<(), RoundStop> {
        let delta = match result {
            Ok(delta) => delta.with_status(role, AgentStatus::Done),
            Err(Cancelled) => {
                let line = format!("[{}] cancelled", role);
                self.state.lock().await.apply(
                    StateDelta::new()
                        .with_status(role, AgentStatus::Idle)
                        .with_log(line.clone()),
                );
                self.ctx.events.status(role, AgentStatus::Idle).await;
                self.ctx.events.log(line).await;
                return Err(RoundStop::Cancelled);
            }
        };

        self.state.lock().await.apply(delta.clone());
        debug!("{} delta merged", role);

        let logs = delta.execution_logs.clone();
        self.ctx.events.emit(ConsultationEvent::NodeFinished { role, data: delta }).await;
        self.ctx.events.status(role, AgentStatus::Done).await;
        for line in logs {
            self.ctx.events.log(line).await;
        }
        Ok(())
    }

    async fn log(&self, line: impl Into<String>) {
        let line = line.into();
        self.state
            .lock()
            .await
            .apply(StateDelta::new().with_log(line.clone()));
        self.ctx.events.log(line).await;
    }
}

/// Run the unit behind a role.
async fn dispatch<G: LlmGateway>(
    ctx: &NodeContext<G>,
    role: Role,
    snapshot: &CaseState,
) -> Result<StateDelta, Cancelled> {
    match role {
        Role::CaseOrganizer => organizer::run_node(ctx, snapshot).await,
        Role::Router => router::run_node(ctx, snapshot).await,
        Role::Radiologist | Role::Pathologist | Role::Pulmonologist | Role::Rheumatologist => {
            specialist::run_node(ctx, role, snapshot).await
        }
        Role::ConflictDetector => conflict::run_node(ctx, snapshot).await,
        Role::Discussion => discussion::run_node(ctx, snapshot).await,
        Role::Moderator => moderator::run_node(ctx, snapshot).await,
    }
}
