//! Type definitions for the RunRound use case.

use crate::config::ConsultationParams;
use crate::ports::consultation_event::EventSink;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use mdt_domain::{GenerationOptions, Model, Role, RoleModels};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The round was stopped by the user.
///
/// A control signal rather than a failure: nodes return it to unwind, and
/// the executor reports it separately from errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Operation cancelled")]
pub struct Cancelled;

/// Why a generation call produced no text.
#[derive(Error, Debug)]
pub(crate) enum GenerationError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Failed(#[from] GatewayError),
}

impl GenerationError {
    /// Split off cancellation so callers can `?` it and handle the failure.
    pub(crate) fn into_failure(self) -> Result<GatewayError, Cancelled> {
        match self {
            GenerationError::Cancelled => Err(Cancelled),
            GenerationError::Failed(e) => Ok(e),
        }
    }
}

impl From<Cancelled> for GenerationError {
    fn from(_: Cancelled) -> Self {
        GenerationError::Cancelled
    }
}

/// Output of a role that produces a detailed text and a condensed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleOutput {
    pub content: String,
    pub summary: String,
    /// The generation call failed and both texts are placeholders
    pub failed: bool,
}

impl RoleOutput {
    pub fn new(content: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            summary: summary.into(),
            failed: false,
        }
    }

    pub fn failed(content: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            failed: true,
            ..Self::new(content, summary)
        }
    }
}

/// How a round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The final stage completed
    Completed,
    /// The cancellation signal stopped the round
    Cancelled,
    /// An unexpected failure ended the round early; merged state is kept
    Failed(String),
}

impl RoundOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RoundOutcome::Completed)
    }
}

/// Why the executor stopped scheduling nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RoundStop {
    Cancelled,
    Failed(String),
}

impl From<Cancelled> for RoundStop {
    fn from(_: Cancelled) -> Self {
        RoundStop::Cancelled
    }
}

/// Everything a node needs besides the Case State snapshot.
///
/// Shared by reference between concurrently running nodes.
pub(crate) struct NodeContext<G: LlmGateway> {
    pub gateway: Arc<G>,
    pub models: RoleModels,
    pub params: ConsultationParams,
    pub events: EventSink,
    pub cancel: CancellationToken,
}

impl<G: LlmGateway> NodeContext<G> {
    pub fn model(&self, role: Role) -> &Model {
        self.models.model(role)
    }

    pub fn options(&self, role: Role) -> GenerationOptions {
        GenerationOptions::for_binding(self.models.binding(role), None)
    }

    pub fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        Ok(())
    }
}
