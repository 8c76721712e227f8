//! Scripted gateway for round tests.

use super::types::NodeContext;
use crate::config::ConsultationParams;
use crate::ports::consultation_event::{ConsultationEvent, EventSink};
use crate::ports::llm_gateway::{GatewayError, LlmGateway, StreamHandle};
use async_trait::async_trait;
use mdt_domain::{GenerationOptions, Message, MessageRole, RoleModels, StreamEvent};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Node context over a scripted gateway, with default models and params.
pub fn context_with(
    gateway: ScriptedGateway,
) -> (NodeContext<ScriptedGateway>, mpsc::Receiver<ConsultationEvent>) {
    let (events, rx) = EventSink::channel(64);
    let ctx = NodeContext {
        gateway: Arc::new(gateway),
        models: RoleModels::default(),
        params: ConsultationParams::default(),
        events,
        cancel: CancellationToken::new(),
    };
    (ctx, rx)
}

/// Canned behaviour for one kind of request.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(&'static str),
    Chunks(Vec<&'static str>),
    Fail(&'static str),
    Hang,
    Panic(&'static str),
}

/// A request the gateway received.
#[derive(Debug, Clone)]
pub struct Call {
    pub system: String,
    pub user: String,
    pub options: GenerationOptions,
}

/// Gateway answering by the first rule whose needle occurs in the system
/// prompt. An empty needle matches everything.
pub struct ScriptedGateway {
    rules: Vec<(&'static str, Reply)>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, needle: &'static str, reply: Reply) -> Self {
        self.rules.push((needle, reply));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, needle: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.system.contains(needle))
            .collect()
    }

    fn reply_for(&self, messages: &[Message], options: &GenerationOptions) -> Reply {
        let text_of = |role: MessageRole| {
            messages
                .iter()
                .filter(|m| m.role == role)
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };
        let system = text_of(MessageRole::System);
        self.calls.lock().unwrap().push(Call {
            system: system.clone(),
            user: text_of(MessageRole::User),
            options: options.clone(),
        });

        self.rules
            .iter()
            .find(|(needle, _)| system.contains(needle))
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Fail("no scripted reply"))
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<String, GatewayError> {
        match self.reply_for(messages, options) {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::Chunks(chunks) => Ok(chunks.concat()),
            Reply::Fail(message) => Err(GatewayError::RequestFailed(message.to_string())),
            Reply::Hang => futures::future::pending().await,
            Reply::Panic(message) => panic!("{}", message),
        }
    }

    async fn complete_streaming(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<StreamHandle, GatewayError> {
        let chunks = match self.reply_for(messages, options) {
            Reply::Text(text) => vec![text],
            Reply::Chunks(chunks) => chunks,
            Reply::Fail(message) => return Err(GatewayError::RequestFailed(message.to_string())),
            Reply::Hang => return futures::future::pending().await,
            Reply::Panic(message) => panic!("{}", message),
        };

        let (tx, rx) = mpsc::channel(chunks.len() + 1);
        for chunk in &chunks {
            let _ = tx.send(StreamEvent::Delta(chunk.to_string())).await;
        }
        let _ = tx.send(StreamEvent::Completed(chunks.concat())).await;
        Ok(StreamHandle::new(rx))
    }
}
