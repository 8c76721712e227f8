//! Cancellable generation calls.
//!
//! Every model call of a round goes through [`generate`]. Streamed chunks
//! are read from the gateway's channel by this single reader, which owns the
//! accumulated text and forwards each chunk to the event sink.

use super::types::{GenerationError, NodeContext};
use crate::ports::consultation_event::StreamTarget;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use mdt_domain::{GenerationOptions, Message, Role, StreamEvent};
use tracing::debug;

/// Run one generation call for `role`.
///
/// With a `target` the call is streamed and every chunk is emitted as a
/// token event; without one the full answer is awaited. The cancellation
/// signal aborts the call at any point, including mid-stream.
pub(crate) async fn generate<G: LlmGateway>(
    ctx: &NodeContext<G>,
    role: Role,
    messages: Vec<Message>,
    options: GenerationOptions,
    target: Option<StreamTarget>,
) -> Result<String, GenerationError> {
    ctx.check_cancelled()?;

    let Some(target) = target else {
        return tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(GenerationError::Cancelled),
            result = ctx.gateway.complete(&messages, &options) => Ok(result?),
        };
    };

    let options = options.streaming();
    let mut handle = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return Err(GenerationError::Cancelled),
        result = ctx.gateway.complete_streaming(&messages, &options) => result?,
    };

    let mut full_text = String::new();
    loop {
        let event = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                debug!("{} stream cancelled after {} bytes", role, full_text.len());
                return Err(GenerationError::Cancelled);
            }
            event = handle.receiver.recv() => event,
        };

        match event {
            Some(StreamEvent::Delta(chunk)) => {
                if chunk.is_empty() {
                    continue;
                }
                full_text.push_str(&chunk);
                ctx.events.token(role, chunk, target).await;
            }
            Some(StreamEvent::Completed(text)) => {
                // Use completed content when no deltas were received
                if full_text.is_empty() && !text.is_empty() {
                    ctx.events.token(role, text.clone(), target).await;
                    return Ok(text);
                }
                return Ok(full_text);
            }
            Some(StreamEvent::Error(e)) => {
                return Err(GenerationError::Failed(GatewayError::RequestFailed(e)));
            }
            None => {
                debug!("{} stream closed without completion", role);
                return Ok(full_text);
            }
        }
    }
}
