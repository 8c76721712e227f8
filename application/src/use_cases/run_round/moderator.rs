//! Moderator unit.

use super::generation::generate;
use super::types::{Cancelled, GenerationError, NodeContext, RoleOutput};
use crate::ports::consultation_event::StreamTarget;
use crate::ports::llm_gateway::LlmGateway;
use mdt_domain::{CaseState, ChatMessage, Message, PromptTemplate, Role, StateDelta};
use tracing::warn;

pub const REPLY_FAILED: &str =
    "The MDT moderator could not complete a reply for this round. Please try again.";
pub const SUMMARY_FAILED: &str = "MDT summary unavailable: the moderator failed.";

/// Synthesize the round and answer the referring clinician.
///
/// `content` is the reply for the transcript, `summary` the internal
/// synthesis. The synthesis streams to the `summary` target and the reply
/// to `chat`. A failed call turns both into fixed error strings.
pub(crate) async fn summarize_and_reply<G: LlmGateway>(
    ctx: &NodeContext<G>,
    snapshot: &CaseState,
) -> Result<RoleOutput, Cancelled> {
    let result = async {
        let synthesis_messages = vec![
            Message::system(PromptTemplate::moderator_system()),
            Message::user(PromptTemplate::moderator_synthesis(
                &snapshot.structured_info,
                &snapshot.chat_history,
                &snapshot.specialist_opinions,
                &snapshot.discussion_notes,
            )),
        ];
        let synthesis = generate(
            ctx,
            Role::Moderator,
            synthesis_messages,
            ctx.options(Role::Moderator),
            Some(StreamTarget::Summary),
        )
        .await?;

        let reply_messages = vec![
            Message::system(PromptTemplate::moderator_system()),
            Message::user(PromptTemplate::moderator_reply(&synthesis, &snapshot.dialogue())),
        ];
        let reply = generate(
            ctx,
            Role::Moderator,
            reply_messages,
            ctx.options(Role::Moderator),
            Some(StreamTarget::Chat),
        )
        .await?;

        Ok::<_, GenerationError>(RoleOutput::new(reply, synthesis))
    }
    .await;

    match result {
        Ok(output) => Ok(output),
        Err(e) => {
            let e = e.into_failure()?;
            warn!("Moderator failed: {}", e);
            Ok(RoleOutput::failed(REPLY_FAILED, SUMMARY_FAILED))
        }
    }
}

pub(crate) async fn run_node<G: LlmGateway>(
    ctx: &NodeContext<G>,
    snapshot: &CaseState,
) -> Result<StateDelta, Cancelled> {
    let output = summarize_and_reply(ctx, snapshot).await?;
    Ok(StateDelta::new()
        .with_log(if output.failed {
            format!("[{}] failed, fallback reply recorded", Role::Moderator)
        } else {
            format!("[{}] summary and reply complete", Role::Moderator)
        })
        .with_moderator_summary(output.summary)
        .with_chat(ChatMessage::from_role(
            Role::Moderator,
            output.content,
            Some(ctx.model(Role::Moderator)),
        )))
}
