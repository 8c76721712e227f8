//! Consultation event port
//!
//! The executor reports progress as an ordered stream of
//! [`ConsultationEvent`]s. The stream is a bounded channel: a slow consumer
//! applies backpressure to the producing round instead of buffering without
//! limit. Every round ends with exactly one [`ConsultationEvent::Done`].

use mdt_domain::{AgentStatus, Role, StateDelta};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Which stream of a role a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamTarget {
    /// A specialist's detailed analysis
    Opinion,
    /// A specialist's condensed summary
    SpecialistSummary,
    /// Team discussion notes
    Discussion,
    /// The moderator's internal synthesis
    Summary,
    /// The moderator's reply in the main transcript
    Chat,
}

impl StreamTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamTarget::Opinion => "opinion",
            StreamTarget::SpecialistSummary => "specialist_summary",
            StreamTarget::Discussion => "discussion",
            StreamTarget::Summary => "summary",
            StreamTarget::Chat => "chat",
        }
    }
}

/// One event of a consultation round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsultationEvent {
    /// A role changed execution status
    Status { role: Role, status: AgentStatus },
    /// A diagnostic line, also recorded in `execution_logs`
    Log { content: String },
    /// A streamed chunk of model output
    Token {
        role: Role,
        content: String,
        target: StreamTarget,
    },
    /// A node finished and its delta has been merged
    NodeFinished { role: Role, data: StateDelta },
    /// The round hit an unexpected failure
    Error { content: String },
    /// Terminal event; nothing follows it
    Done,
}

impl ConsultationEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsultationEvent::Done)
    }
}

/// Producer side of the event stream.
///
/// Cloned into every concurrently running node. Sending never fails from the
/// producer's point of view: once the consumer is gone events are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::Sender<ConsultationEvent>,
}

impl EventSink {
    /// Create a sink and the receiver that drains it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ConsultationEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub async fn emit(&self, event: ConsultationEvent) {
        if self.sender.send(event).await.is_err() {
            debug!("Event consumer dropped, discarding event");
        }
    }

    pub async fn status(&self, role: Role, status: AgentStatus) {
        self.emit(ConsultationEvent::Status { role, status }).await;
    }

    pub async fn log(&self, content: impl Into<String>) {
        self.emit(ConsultationEvent::Log {
            content: content.into(),
        })
        .await;
    }

    pub async fn token(&self, role: Role, content: impl Into<String>, target: StreamTarget) {
        self.emit(ConsultationEvent::Token {
            role,
            content: content.into(),
            target,
        })
        .await;
    }
}
