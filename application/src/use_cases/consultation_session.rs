//! Consultation session use case
//!
//! A [`ConsultationSession`] owns one Case State for the lifetime of a
//! consultation. Each user submission is recorded, then a round is started
//! on a dedicated task that reports through a [`RoundHandle`].

use crate::config::ConsultationParams;
use crate::ports::consultation_event::{ConsultationEvent, EventSink};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::round_recorder::RoundRecorder;
use crate::use_cases::run_round::{RoundOutcome, RunRoundInput, RunRoundUseCase};
use mdt_domain::{CaseState, CaseText, DomainError, Model, Role, RoleModels};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Errors that can occur when submitting a round
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Case text is empty")]
    EmptyCaseText,

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("A round is already running for this session")]
    RoundInProgress,
}

impl From<DomainError> for SubmitError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UnknownRole(name) => SubmitError::UnknownRole(name),
            _ => SubmitError::EmptyCaseText,
        }
    }
}

/// One user submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub case_text: CaseText,
    /// Roles enabled for this round; `None` keeps the session defaults
    pub selected_agents: Option<Vec<Role>>,
    /// Per-round model overrides
    pub model_configs: BTreeMap<Role, Model>,
}

impl Submission {
    pub fn new(case_text: impl Into<String>) -> Result<Self, SubmitError> {
        Ok(Self {
            case_text: CaseText::try_new(case_text)?,
            selected_agents: None,
            model_configs: BTreeMap::new(),
        })
    }

    /// Build a submission from wire-level names.
    pub fn from_names(
        case_text: impl Into<String>,
        selected_agents: Option<&[String]>,
        model_configs: &BTreeMap<String, String>,
    ) -> Result<Self, SubmitError> {
        let mut submission = Self::new(case_text)?;
        if let Some(names) = selected_agents {
            let roles = names
                .iter()
                .map(|name| name.parse::<Role>())
                .collect::<Result<Vec<_>, _>>()?;
            submission.selected_agents = Some(roles);
        }
        for (role, model) in model_configs {
            submission
                .model_configs
                .insert(role.parse::<Role>()?, Model::from(model.as_str()));
        }
        Ok(submission)
    }

    pub fn with_agents(mut self, roles: Vec<Role>) -> Self {
        self.selected_agents = Some(roles);
        self
    }

    pub fn with_model(mut self, role: Role, model: Model) -> Self {
        self.model_configs.insert(role, model);
        self
    }
}

/// A running round.
///
/// `events` must be drained for the round to make progress; it closes after
/// the terminal event. `cancel` stops the round cooperatively.
pub struct RoundHandle {
    pub round: u32,
    pub events: mpsc::Receiver<ConsultationEvent>,
    pub cancel: CancellationToken,
    pub completion: JoinHandle<RoundOutcome>,
}

/// One consultation: its Case State plus the defaults rounds run with.
pub struct ConsultationSession<G: LlmGateway + 'static> {
    id: String,
    state: Arc<Mutex<CaseState>>,
    use_case: Arc<RunRoundUseCase<G>>,
    params: ConsultationParams,
    models: RoleModels,
    running: Arc<AtomicBool>,
}

impl<G: LlmGateway + 'static> ConsultationSession<G> {
    pub fn new(
        id: impl Into<String>,
        gateway: Arc<G>,
        recorder: Arc<dyn RoundRecorder>,
        params: ConsultationParams,
        models: RoleModels,
    ) -> Self {
        Self {
            id: id.into(),
            state: Arc::new(Mutex::new(CaseState::new())),
            use_case: Arc::new(RunRoundUseCase::new(gateway).with_recorder(recorder)),
            params,
            models,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn params(&self) -> &ConsultationParams {
        &self.params
    }

    pub fn models(&self) -> &RoleModels {
        &self.models
    }

    /// A copy of the current Case State.
    pub async fn snapshot(&self) -> CaseState {
        self.state.lock().await.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Claim the session for one round, or report that one is running.
    fn claim(&self) -> Result<RunningGuard, SubmitError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SubmitError::RoundInProgress);
        }
        Ok(RunningGuard(Arc::clone(&self.running)))
    }

    /// Record the user's input and advance the round counter.
    ///
    /// Returns the new round number.
    pub async fn submit_case(&self, case_text: &CaseText) -> Result<u32, SubmitError> {
        let _guard = self.claim()?;
        Ok(self.state.lock().await.submit_input(case_text))
    }

    /// Start a round on its own task.
    pub async fn run_round(
        &self,
        params: ConsultationParams,
        models: RoleModels,
    ) -> Result<RoundHandle, SubmitError> {
        let guard = self.claim()?;
        Ok(self.start_round(guard, params, models).await)
    }

    async fn start_round(
        &self,
        guard: RunningGuard,
        params: ConsultationParams,
        models: RoleModels,
    ) -> RoundHandle {
        let round = self.state.lock().await.round_count;
        let (sink, events) = EventSink::channel(params.event_capacity);
        let cancel = CancellationToken::new();
        let input = RunRoundInput::new(self.id.clone(), params, models);

        info!("Session {}: starting round {}", self.id, round);
        let use_case = Arc::clone(&self.use_case);
        let state = Arc::clone(&self.state);
        let token = cancel.clone();
        let completion = tokio::spawn(async move {
            // Released even if the round task unwinds
            let _guard = guard;
            use_case.execute(state, input, sink, token).await
        });

        RoundHandle {
            round,
            events,
            cancel,
            completion,
        }
    }

    /// Record a submission and start its round.
    ///
    /// The session stays claimed from recording the input until the round
    /// ends, so a rejected submission leaves the state untouched. The
    /// submission's agent selection and model overrides apply to this
    /// round only.
    pub async fn submit(&self, submission: Submission) -> Result<RoundHandle, SubmitError> {
        let guard = self.claim()?;
        self.state.lock().await.submit_input(&submission.case_text);

        let params = match submission.selected_agents {
            Some(roles) => self.params.clone().with_enabled_roles(roles),
            None => self.params.clone(),
        };
        let models = self.models.with_overrides(&submission.model_configs);
        Ok(self.start_round(guard, params, models).await)
    }
}

/// Marks a session as running until dropped.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::round_recorder::NoRoundRecorder;
    use crate::use_cases::run_round::test_support::{Reply, ScriptedGateway};

    fn session(gateway: ScriptedGateway) -> (ConsultationSession<ScriptedGateway>, Arc<ScriptedGateway>) {
        let gateway = Arc::new(gateway);
        let session = ConsultationSession::new(
            "session-1",
            Arc::clone(&gateway),
            Arc::new(NoRoundRecorder),
            ConsultationParams::default(),
            RoleModels::default(),
        );
        (session, gateway)
    }

    async fn drain(mut handle: RoundHandle) -> (Vec<ConsultationEvent>, RoundOutcome) {
        let mut events = Vec::new();
        while let Some(event) = handle.events.recv().await {
            events.push(event);
        }
        (events, handle.completion.await.unwrap())
    }

    fn two_round_gateway() -> ScriptedGateway {
        ScriptedGateway::new()
            .on("clinical case organizer", Reply::Text(r#"{"imaging": "UIP"}"#))
            .on("senior", Reply::Text("specialist view"))
    }

    #[tokio::test]
    async fn test_submit_runs_round() {
        let (session, _) = session(two_round_gateway());
        let submission = Submission::new("patient X")
            .unwrap()
            .with_agents(vec![Role::CaseOrganizer, Role::Radiologist]);

        let handle = session.submit(submission).await.unwrap();
        assert_eq!(handle.round, 1);
        let (events, outcome) = drain(handle).await;

        assert_eq!(outcome, RoundOutcome::Completed);
        assert!(events.last().unwrap().is_terminal());
        assert!(!session.is_running());

        let state = session.snapshot().await;
        assert_eq!(state.round_count, 1);
        assert_eq!(state.raw_case_history, vec!["[Round 1 input]\npatient X"]);
        assert_eq!(state.chat_history[0].role, "user");
    }

    #[tokio::test]
    async fn test_opinions_carry_forward_between_rounds() {
        let (session, _) = session(two_round_gateway());

        let first = Submission::new("round one")
            .unwrap()
            .with_agents(vec![Role::CaseOrganizer, Role::Radiologist, Role::Pulmonologist]);
        drain(session.submit(first).await.unwrap()).await;

        let second = Submission::new("round two")
            .unwrap()
            .with_agents(vec![Role::CaseOrganizer, Role::Pulmonologist]);
        drain(session.submit(second).await.unwrap()).await;

        let state = session.snapshot().await;
        let round1 = &state.specialist_opinions_history[&1];
        let round2 = &state.specialist_opinions_history[&2];
        assert!(round1.keys().all(|role| round2.contains_key(role)));
        assert!(state.specialist_opinions.contains_key(&Role::Radiologist));
    }

    #[tokio::test]
    async fn test_model_overrides_apply_to_one_round() {
        let (session, gateway) = session(two_round_gateway());
        let submission = Submission::new("patient X")
            .unwrap()
            .with_agents(vec![Role::CaseOrganizer])
            .with_model(Role::CaseOrganizer, Model::Custom("local-llm".into()));
        drain(session.submit(submission).await.unwrap()).await;

        let submission = Submission::new("more").unwrap().with_agents(vec![Role::CaseOrganizer]);
        drain(session.submit(submission).await.unwrap()).await;

        let calls = gateway.calls();
        assert_eq!(calls[0].options.model.as_str(), "local-llm");
        assert_eq!(calls[1].options.model, Model::DeepSeekV3);
    }

    #[tokio::test]
    async fn test_rejects_submission_while_running() {
        let (session, _) = session(ScriptedGateway::new().on("", Reply::Hang));
        let handle = session
            .submit(Submission::new("first").unwrap())
            .await
            .unwrap();

        let err = session
            .submit(Submission::new("second").unwrap())
            .await
            .err();
        assert_eq!(err, Some(SubmitError::RoundInProgress));
        assert_eq!(session.snapshot().await.round_count, 1);

        handle.cancel.cancel();
        let (_, outcome) = drain(handle).await;
        assert_eq!(outcome, RoundOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_record_one_input() {
        let (session, _) = session(two_round_gateway());
        let agents = vec![Role::CaseOrganizer];

        // Hold the state so both submissions are in flight together
        let lock = session.state.lock().await;
        let first = session.submit(Submission::new("first").unwrap().with_agents(agents.clone()));
        let second = session.submit(Submission::new("second").unwrap().with_agents(agents));
        let release = async move {
            tokio::task::yield_now().await;
            drop(lock);
        };
        let (first, second, ()) = tokio::join!(first, second, release);

        let (handle, rejected) = match (first, second) {
            (Ok(handle), Err(e)) | (Err(e), Ok(handle)) => (handle, e),
            _ => panic!("exactly one submission must start a round"),
        };
        assert_eq!(rejected, SubmitError::RoundInProgress);
        drain(handle).await;

        let state = session.snapshot().await;
        assert_eq!(state.round_count, 1);
        assert_eq!(state.raw_case_history.len(), 1);
        assert_eq!(state.chat_history.iter().filter(|m| m.role == "user").count(), 1);
    }

    #[tokio::test]
    async fn test_panicking_round_releases_session() {
        let (session, _) = session(
            ScriptedGateway::new()
                .on("clinical case organizer", Reply::Text(r#"{"imaging": "UIP"}"#))
                .on("", Reply::Panic("gateway bug")),
        );
        let handle = session.submit(Submission::new("patient X").unwrap()).await.unwrap();
        let (events, outcome) = drain(handle).await;

        assert!(matches!(outcome, RoundOutcome::Failed(ref m) if m.contains("gateway bug")));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert!(!session.is_running());

        let next = session.submit(Submission::new("follow-up").unwrap().with_agents(vec![Role::CaseOrganizer]));
        let (_, outcome) = drain(next.await.unwrap()).await;
        assert_eq!(outcome, RoundOutcome::Completed);
        assert_eq!(session.snapshot().await.round_count, 2);
    }

    #[test]
    fn test_submission_from_names() {
        let models = [("radiologist".to_string(), "gpt-5.1".to_string())].into();
        let agents = vec!["Case Organizer".to_string(), "Radiologist".to_string()];
        let submission = Submission::from_names("case", Some(&agents), &models).unwrap();
        assert_eq!(
            submission.selected_agents,
            Some(vec![Role::CaseOrganizer, Role::Radiologist])
        );
        assert_eq!(submission.model_configs[&Role::Radiologist], Model::Gpt51);

        let bad = vec!["Dermatologist".to_string()];
        assert_eq!(
            Submission::from_names("case", Some(&bad), &BTreeMap::new()).err(),
            Some(SubmitError::UnknownRole("Dermatologist".into()))
        );
        assert_eq!(
            Submission::new("   ").err(),
            Some(SubmitError::EmptyCaseText)
        );
    }
}
