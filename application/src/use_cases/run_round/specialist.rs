//! Specialist units (radiology, pathology, pulmonology, rheumatology).

use super::generation::generate;
use super::types::{Cancelled, GenerationError, NodeContext, RoleOutput};
use crate::ports::consultation_event::StreamTarget;
use crate::ports::llm_gateway::LlmGateway;
use mdt_domain::{CaseState, ChatMessage, Message, PromptTemplate, Role, StateDelta};
use tracing::warn;

const SUMMARY_UNAVAILABLE: &str = "No information.";
const ANALYSIS_FAILED: &str = "Analysis failed.";

/// Run one specialist: a detailed analysis, then a condensed summary.
///
/// Without a structured case there is nothing to analyse and the model is
/// not called. A failed call yields an output describing the failure.
pub(crate) async fn analyze<G: LlmGateway>(
    ctx: &NodeContext<G>,
    role: Role,
    snapshot: &CaseState,
) -> Result<RoleOutput, Cancelled> {
    if snapshot.structured_info.is_empty() {
        return Ok(RoleOutput::new(
            format!(
                "No structured case information is available; {} analysis skipped.",
                role.as_str().to_lowercase()
            ),
            SUMMARY_UNAVAILABLE,
        ));
    }

    let dependency = role.depends_on().first().map(|dep| {
        let opinion = snapshot
            .specialist_opinions
            .get(dep)
            .map(String::as_str)
            .unwrap_or("No opinion available.");
        (*dep, opinion)
    });

    let system = PromptTemplate::specialist_system(role);
    let analysis_messages = vec![
        Message::system(system.clone()),
        Message::user(PromptTemplate::specialist_analysis(
            &snapshot.structured_info,
            &snapshot.chat_history,
            dependency,
        )),
    ];

    let result = async {
        let analysis = generate(
            ctx,
            role,
            analysis_messages,
            ctx.options(role),
            Some(StreamTarget::Opinion),
        )
        .await?;

        let summary_messages = vec![
            Message::system(system),
            Message::user(PromptTemplate::specialist_summary(&analysis)),
        ];
        let summary = generate(
            ctx,
            role,
            summary_messages,
            ctx.options(role),
            Some(StreamTarget::SpecialistSummary),
        )
        .await?;

        Ok::<_, GenerationError>(RoleOutput::new(analysis, summary))
    }
    .await;

    match result {
        Ok(output) => Ok(output),
        Err(e) => {
            let e = e.into_failure()?;
            warn!("{} analysis failed: {}", role, e);
            Ok(RoleOutput::failed(
                format!("{} analysis failed: {}", role, e),
                ANALYSIS_FAILED,
            ))
        }
    }
}

pub(crate) async fn run_node<G: LlmGateway>(
    ctx: &NodeContext<G>,
    role: Role,
    snapshot: &CaseState,
) -> Result<StateDelta, Cancelled> {
    let output = analyze(ctx, role, snapshot).await?;

    let mut delta = StateDelta::new()
        .with_log(format!(
            "[{}] submitted opinion: {} chars",
            role,
            output.content.chars().count()
        ))
        .with_summary(role, output.summary);
    if ctx.params.record_specialist_turns {
        delta = delta.with_chat(ChatMessage::from_role(
            role,
            output.content.clone(),
            Some(ctx.model(role)),
        ));
    }
    Ok(delta.with_opinion(role, output.content))
}
