//! Conflict Detector unit.

use super::generation::generate;
use super::types::{Cancelled, NodeContext};
use crate::ports::llm_gateway::LlmGateway;
use mdt_domain::{CaseState, Conflict, Message, PromptTemplate, Role, StateDelta, parse_conflicts};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Compare specialist summaries and report disagreements.
///
/// The result is never empty: skipped detection, a clean comparison and an
/// unreadable answer each produce one explanatory record.
pub(crate) async fn detect<G: LlmGateway>(
    ctx: &NodeContext<G>,
    summaries: &BTreeMap<Role, String>,
) -> Result<Vec<Conflict>, Cancelled> {
    if summaries.len() < 2 {
        debug!("Skipping conflict detection with {} summaries", summaries.len());
        return Ok(vec![Conflict::insufficient(summaries.len())]);
    }

    let messages = vec![
        Message::system(PromptTemplate::conflict_system()),
        Message::user(PromptTemplate::conflict_prompt(summaries)),
    ];

    let response = match generate(
        ctx,
        Role::ConflictDetector,
        messages,
        ctx.options(Role::ConflictDetector).json(),
        None,
    )
    .await
    {
        Ok(text) => text,
        Err(e) => {
            let e = e.into_failure()?;
            warn!("Conflict detection call failed: {}", e);
            return Ok(vec![Conflict::unreadable(format!(
                "The conflict detector could not be reached: {}",
                e
            ))]);
        }
    };

    Ok(match parse_conflicts(&response) {
        Some(conflicts) if conflicts.is_empty() => vec![Conflict::no_conflicts()],
        Some(conflicts) => conflicts,
        None => {
            warn!("Conflict detector returned an unrecognized shape");
            vec![Conflict::unreadable(
                "The conflict detector's answer could not be interpreted.",
            )]
        }
    })
}

pub(crate) async fn run_node<G: LlmGateway>(
    ctx: &NodeContext<G>,
    snapshot: &CaseState,
) -> Result<StateDelta, Cancelled> {
    let conflicts = detect(ctx, &snapshot.specialist_summaries).await?;
    let disagreements = conflicts.iter().filter(|c| c.is_disagreement()).count();

    Ok(StateDelta::new()
        .with_log(format!(
            "[{}] {} record(s), {} disagreement(s)",
            Role::ConflictDetector,
            conflicts.len(),
            disagreements
        ))
        .with_conflicts(conflicts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::run_round::test_support::{Reply, ScriptedGateway, context_with};
    use mdt_domain::ConflictSeverity;

    const NEEDLE: &str = "audit a multidisciplinary team";

    fn two_summaries() -> BTreeMap<Role, String> {
        [
            (Role::Radiologist, "Definite UIP pattern".to_string()),
            (Role::Rheumatologist, "NSIP pattern, CTD-ILD".to_string()),
        ]
        .into()
    }

    #[tokio::test]
    async fn test_fewer_than_two_summaries() {
        let (ctx, _rx) = context_with(ScriptedGateway::new());

        for summaries in [BTreeMap::new(), [(Role::Radiologist, "UIP".to_string())].into()] {
            let conflicts = detect(&ctx, &summaries).await.unwrap();
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].severity, ConflictSeverity::Info);
        }
        assert!(ctx.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_disagreement_is_one_success_record() {
        let gateway = ScriptedGateway::new().on(NEEDLE, Reply::Text(r#"{"conflicts": []}"#));
        let (ctx, _rx) = context_with(gateway);

        let conflicts = detect(&ctx, &two_summaries()).await.unwrap();
        assert_eq!(conflicts, vec![Conflict::no_conflicts()]);
        assert!(ctx.gateway.calls()[0].options.json_mode);
    }

    #[tokio::test]
    async fn test_contradiction_is_reported() {
        let gateway = ScriptedGateway::new().on(
            NEEDLE,
            Reply::Text(
                r#"[{"issue": "Imaging pattern", "description": "Radiologist reads UIP, Rheumatologist NSIP", "severity": "high"}]"#,
            ),
        );
        let (ctx, _rx) = context_with(gateway);

        let conflicts = detect(&ctx, &two_summaries()).await.unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].severity, ConflictSeverity::Warning);
    }

    #[tokio::test]
    async fn test_unreadable_answer() {
        let gateway = ScriptedGateway::new().on(NEEDLE, Reply::Text(r#"{"verdict": "fine"}"#));
        let (ctx, _rx) = context_with(gateway);

        let delta = run_node(
            &ctx,
            &CaseState {
                specialist_summaries: two_summaries(),
                ..CaseState::default()
            },
        )
        .await
        .unwrap();
        let conflicts = delta.conflicts.unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].severity, ConflictSeverity::Info);
    }
}
