//! Case Organizer unit.

use super::generation::generate;
use super::types::{Cancelled, NodeContext};
use crate::ports::llm_gateway::LlmGateway;
use mdt_domain::{
    CaseState, ChatMessage, Message, PromptTemplate, Role, StateDelta, StructuredCase,
    parse_structuring,
};
use tracing::{info, warn};

const NO_CASE_TEXT: &str = "No case information was provided, so there is nothing to organize.";

/// Outcome of structuring the latest input.
#[derive(Debug, Clone, PartialEq)]
pub struct Structuring {
    /// Transcript entry for the organizer
    pub reply: String,
    /// New digest; `None` leaves the previous digest in place
    pub case: Option<StructuredCase>,
}

/// Structure the raw case text.
///
/// The first round builds a full digest. Once a digest exists, later rounds
/// ask for an update plus the evidence the latest input adds.
pub(crate) async fn structure<G: LlmGateway>(
    ctx: &NodeContext<G>,
    snapshot: &CaseState,
) -> Result<Structuring, Cancelled> {
    let case_text = snapshot.raw_case_text.trim();
    if case_text.is_empty() {
        return Ok(Structuring {
            reply: NO_CASE_TEXT.to_string(),
            case: None,
        });
    }

    let is_update = !snapshot.structured_info.is_empty();
    let prompt = if is_update {
        PromptTemplate::organizer_update(&snapshot.structured_info, case_text)
    } else {
        PromptTemplate::organizer_initial(case_text)
    };
    let messages = vec![
        Message::system(PromptTemplate::organizer_system()),
        Message::user(prompt),
    ];

    let response = match generate(
        ctx,
        Role::CaseOrganizer,
        messages,
        ctx.options(Role::CaseOrganizer).json(),
        None,
    )
    .await
    {
        Ok(text) => text,
        Err(e) => {
            let e = e.into_failure()?;
            warn!("Case organizer call failed: {}", e);
            return Ok(Structuring {
                reply: format!("Case structuring failed: {}", e),
                case: None,
            });
        }
    };

    match parse_structuring(&response, is_update) {
        Ok(case) => {
            info!(
                "Structured case: {} fields, {} evidence categories",
                case.structured_info.len(),
                case.new_evidence.len()
            );
            Ok(Structuring {
                reply: describe(&case, is_update),
                case: Some(case),
            })
        }
        Err(e) => {
            warn!("Case organizer output unusable: {}", e);
            Ok(Structuring {
                reply: format!("Case structuring failed: {}", e),
                case: None,
            })
        }
    }
}

fn describe(case: &StructuredCase, is_update: bool) -> String {
    let mut reply = if is_update {
        format!("Structured case updated ({} fields).", case.structured_info.len())
    } else {
        format!("Case structured into {} fields.", case.structured_info.len())
    };

    for (category, items) in &case.new_evidence {
        reply.push_str(&format!("\n- {}: {}", category, items.join("; ")));
    }
    reply
}

pub(crate) async fn run_node<G: LlmGateway>(
    ctx: &NodeContext<G>,
    snapshot: &CaseState,
) -> Result<StateDelta, Cancelled> {
    let outcome = structure(ctx, snapshot).await?;
    let model = ctx.model(Role::CaseOrganizer);

    let mut delta = StateDelta::new();
    let log = match outcome.case {
        Some(case) => {
            let log = format!(
                "[{}] structured {} fields",
                Role::CaseOrganizer,
                case.structured_info.len()
            );
            delta = delta
                .with_structured_info(case.structured_info)
                .with_new_evidence(case.new_evidence);
            log
        }
        None => format!("[{}] digest unchanged", Role::CaseOrganizer),
    };

    Ok(delta
        .with_chat(ChatMessage::from_role(
            Role::CaseOrganizer,
            outcome.reply,
            Some(model),
        ))
        .with_log(log))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::run_round::test_support::{Reply, ScriptedGateway, context_with};
    use mdt_domain::CaseText;

    const NEEDLE: &str = "clinical case organizer";

    fn state_with(text: &str) -> CaseState {
        let mut state = CaseState::new();
        state.submit_input(&CaseText::try_new(text).unwrap());
        state
    }

    #[tokio::test]
    async fn test_first_round_builds_digest() {
        let gateway = ScriptedGateway::new().on(NEEDLE, Reply::Text(r#"{"symptoms": "dry cough"}"#));
        let (ctx, _rx) = context_with(gateway);

        let delta = run_node(&ctx, &state_with("65M dry cough")).await.unwrap();
        assert_eq!(delta.structured_info.unwrap()["symptoms"], "dry cough");
        assert_eq!(delta.chat_history[0].role, "Case Organizer");
        assert!(ctx.gateway.calls()[0].options.json_mode);
    }

    #[tokio::test]
    async fn test_update_round_uses_existing_digest() {
        let gateway = ScriptedGateway::new().on(
            NEEDLE,
            Reply::Text(
                r#"{"updated_case": {"symptoms": "dry cough", "lab_results": "ANA 1:320"},
                    "new_evidence": {"new_lab_results": ["ANA 1:320"]}}"#,
            ),
        );
        let (ctx, _rx) = context_with(gateway);
        let mut state = state_with("65M dry cough");
        state.structured_info.insert("symptoms".into(), "dry cough".into());
        state.submit_input(&CaseText::try_new("ANA 1:320").unwrap());

        let delta = run_node(&ctx, &state).await.unwrap();
        assert_eq!(delta.structured_info.unwrap().len(), 2);
        assert_eq!(delta.new_evidence.unwrap()["new_lab_results"], vec!["ANA 1:320"]);
        assert!(delta.chat_history[0].content.contains("new_lab_results: ANA 1:320"));
        assert!(ctx.gateway.calls()[0].user.contains("Existing structured case"));
    }

    #[tokio::test]
    async fn test_unparseable_output_keeps_digest() {
        let gateway = ScriptedGateway::new().on(NEEDLE, Reply::Text("Sorry, I cannot help"));
        let (ctx, _rx) = context_with(gateway);

        let delta = run_node(&ctx, &state_with("case")).await.unwrap();
        assert!(delta.structured_info.is_none());
        assert!(delta.new_evidence.is_none());
        assert!(delta.chat_history[0].content.starts_with("Case structuring failed"));
    }

    #[tokio::test]
    async fn test_empty_case_text_skips_model() {
        let (ctx, _rx) = context_with(ScriptedGateway::new());
        let delta = run_node(&ctx, &CaseState::new()).await.unwrap();
        assert_eq!(delta.chat_history[0].content, NO_CASE_TEXT);
        assert!(ctx.gateway.calls().is_empty());
    }
}
