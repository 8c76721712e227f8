//! Discussion unit.

use super::generation::generate;
use super::types::{Cancelled, NodeContext};
use crate::ports::consultation_event::StreamTarget;
use crate::ports::llm_gateway::LlmGateway;
use mdt_domain::{CaseState, Message, PromptTemplate, Role, StateDelta};
use tracing::warn;

/// Produce consensus notes from the opinions and the conflict records.
///
/// Runs whether or not real conflicts were found; the placeholder records
/// are passed through and the model decides whether reconciliation is needed.
pub(crate) async fn discuss<G: LlmGateway>(
    ctx: &NodeContext<G>,
    snapshot: &CaseState,
) -> Result<String, Cancelled> {
    let messages = vec![
        Message::system(PromptTemplate::discussion_system()),
        Message::user(PromptTemplate::discussion_prompt(
            &snapshot.raw_case_text,
            &snapshot.specialist_opinions,
            &snapshot.conflicts,
        )),
    ];

    match generate(
        ctx,
        Role::Discussion,
        messages,
        ctx.options(Role::Discussion),
        Some(StreamTarget::Discussion),
    )
    .await
    {
        Ok(notes) => Ok(notes),
        Err(e) => {
            let e = e.into_failure()?;
            warn!("Team discussion failed: {}", e);
            Ok(format!("Team discussion failed: {}", e))
        }
    }
}

pub(crate) async fn run_node<G: LlmGateway>(
    ctx: &NodeContext<G>,
    snapshot: &CaseState,
) -> Result<StateDelta, Cancelled> {
    let notes = discuss(ctx, snapshot).await?;
    Ok(StateDelta::new()
        .with_log(format!(
            "[{}] consensus notes: {} chars",
            Role::Discussion,
            notes.chars().count()
        ))
        .with_discussion_notes(notes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::run_round::test_support::{Reply, ScriptedGateway, context_with};
    use mdt_domain::Conflict;

    const NEEDLE: &str = "chair the discussion";

    #[tokio::test]
    async fn test_discussion_sees_opinions_and_placeholders() {
        let gateway = ScriptedGateway::new().on(NEEDLE, Reply::Text("Consensus: fibrotic ILD."));
        let (ctx, _rx) = context_with(gateway);
        let mut state = CaseState::new();
        state.raw_case_text = "65M dry cough".into();
        state.specialist_opinions.insert(Role::Radiologist, "UIP".into());
        state.conflicts = vec![Conflict::insufficient(1)];

        let delta = run_node(&ctx, &state).await.unwrap();
        assert_eq!(delta.discussion_notes.as_deref(), Some("Consensus: fibrotic ILD."));
        assert!(delta.chat_history.is_empty());

        let user = &ctx.gateway.calls()[0].user;
        assert!(user.contains("[Radiologist]\nUIP"));
        assert!(user.contains("Conflict detection skipped"));
        assert!(user.contains("65M dry cough"));
    }

    #[tokio::test]
    async fn test_failure_becomes_notes() {
        let gateway = ScriptedGateway::new().on(NEEDLE, Reply::Fail("timeout"));
        let (ctx, _rx) = context_with(gateway);

        let notes = discuss(&ctx, &CaseState::new()).await.unwrap();
        assert!(notes.starts_with("Team discussion failed"));
    }
}
