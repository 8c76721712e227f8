//! Router unit.

use super::generation::generate;
use super::types::{Cancelled, NodeContext};
use crate::ports::llm_gateway::LlmGateway;
use mdt_domain::{CaseState, Message, PromptTemplate, Role, RoutingDecision, StateDelta};
use tracing::{info, warn};

/// Decide which enabled specialists take part in this round.
///
/// Never fails: an unusable answer or a failed call resolves to the fixed
/// fallback selection, with the anomaly recorded on the decision.
pub(crate) async fn plan<G: LlmGateway>(
    ctx: &NodeContext<G>,
    snapshot: &CaseState,
) -> Result<RoutingDecision, Cancelled> {
    let enabled = &ctx.params.enabled_roles;
    let candidates = RoutingDecision::candidates(enabled);
    if candidates.is_empty() {
        info!("No specialists enabled, skipping routing");
        return Ok(RoutingDecision::from_response("", enabled));
    }

    let messages = vec![
        Message::system(PromptTemplate::router_system()),
        Message::user(PromptTemplate::router_prompt(
            &snapshot.structured_info,
            &snapshot.new_evidence,
            snapshot.round_count,
            &candidates,
        )),
    ];

    let decision = match generate(ctx, Role::Router, messages, ctx.options(Role::Router), None).await
    {
        Ok(response) => RoutingDecision::from_response(&response, enabled),
        Err(e) => {
            let e = e.into_failure()?;
            RoutingDecision::fallback(enabled, format!("router call failed: {}", e))
        }
    };

    if let Some(anomaly) = &decision.anomaly {
        warn!("Routing fell back to {:?}: {}", decision.selected, anomaly);
    }
    Ok(decision)
}

pub(crate) async fn run_node<G: LlmGateway>(
    ctx: &NodeContext<G>,
    snapshot: &CaseState,
) -> Result<StateDelta, Cancelled> {
    let decision = plan(ctx, snapshot).await?;

    let names = decision
        .selected
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let mut delta = StateDelta::new();
    if let Some(anomaly) = &decision.anomaly {
        delta = delta.with_log(format!("[{}] fallback routing: {}", Role::Router, anomaly));
    }
    Ok(delta
        .with_log(format!(
            "[{}] selected: {}",
            Role::Router,
            if names.is_empty() { "none" } else { names.as_str() }
        ))
        .with_selected_agents(decision.selected))
}
