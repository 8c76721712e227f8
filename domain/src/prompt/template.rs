//! Prompt templates for the consultation workflow

use crate::case::ChatMessage;
use crate::consultation::conflict::Conflict;
use crate::role::Role;
use std::collections::BTreeMap;

const NO_HISTORY: &str = "No previous discussion.";
const NOT_AVAILABLE: &str = "None.";

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    // ==================== Case Organizer ====================

    pub fn organizer_system() -> &'static str {
        r#"You are a clinical case organizer for a multidisciplinary team (MDT) meeting.
You turn free-text clinical notes into a precise structured record.
Never invent findings. When something is not mentioned, write "not mentioned"."#
    }

    /// First round: build the digest from the raw case text.
    pub fn organizer_initial(case_text: &str) -> String {
        format!(
            r#"Clinical record:
{}

Extract the information above into a strict JSON object with these fields:

{{
    "basic_info": "patient overview",
    "symptoms": "main symptoms and history of present illness",
    "signs": "positive physical examination findings",
    "lab_results": "key laboratory results",
    "imaging": "imaging findings",
    "pathology": "pathology findings",
    "diagnosis_history": "previous diagnoses and response to treatment",
    "key_questions": "the main questions this MDT must answer"
}}

Return only the JSON object, without Markdown code fences."#,
            case_text
        )
    }

    /// Later rounds: update the existing digest with the latest input.
    pub fn organizer_update(structured_info: &BTreeMap<String, String>, case_text: &str) -> String {
        format!(
            r#"Existing structured case:
{}

Latest input from the referring clinician:
{}

Update the structured case with the latest input:
1. Keep existing information that the new input does not contradict.
2. Replace information the new input corrects or refines.
3. Append new symptoms and results to the matching field.
4. When old and new information conflict, the latest input wins.

Return a JSON object with two parts:
{{
    "updated_case": {{ ...all fields of the structured case... }},
    "new_evidence": {{
        "new_lab_results": [],
        "new_symptoms_info": [],
        "new_imaging_info": [],
        "new_pathology_info": [],
        "answers_to_team_questions": []
    }}
}}

`new_evidence` lists only what the latest input adds, by category; use an empty list
for a category with nothing new. Return only the JSON object, without Markdown code fences."#,
            Self::structured_case(structured_info),
            case_text
        )
    }

    // ==================== Router ====================

    pub fn router_system() -> &'static str {
        r#"You are the moderator of a respiratory multidisciplinary team.
Before each round you decide which specialists must review the case.
Invite only the specialists whose expertise the current evidence requires."#
    }

    pub fn router_prompt(
        structured_info: &BTreeMap<String, String>,
        new_evidence: &BTreeMap<String, Vec<String>>,
        round: u32,
        candidates: &[Role],
    ) -> String {
        let round_context = if round > 1 {
            let evidence = if new_evidence.is_empty() {
                NOT_AVAILABLE.to_string()
            } else {
                serde_json::to_string_pretty(new_evidence).unwrap_or_default()
            };
            format!("Current round: {}\nNew evidence this round:\n{}", round, evidence)
        } else {
            format!("Current round: {} (first round)", round)
        };

        let roster = candidates
            .iter()
            .map(|role| format!("- {}: {}", role.as_str(), role.focus()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Structured case:
{}

{}

Available specialists:
{}

On the first round, invite every specialist whose field the case touches.
On later rounds, invite only the specialists the new evidence concerns.
Answer with a JSON list of specialist names, for example ["Radiologist", "Pulmonologist"].
Return only the list, without Markdown code fences."#,
            Self::structured_case(structured_info),
            round_context,
            roster
        )
    }

    // ==================== Specialists ====================

    pub fn specialist_system(role: Role) -> String {
        format!(
            r#"You are a senior {} on a multidisciplinary team reviewing a respiratory case.
Your field: {}.
Reason from the evidence, state your confidence, and say what further data would change your view.
Stay within your field and defer to colleagues outside it."#,
            role.as_str().to_lowercase(),
            role.focus()
        )
    }

    /// Detailed analysis request.
    ///
    /// `dependency` carries another specialist's current opinion the role
    /// reads before answering.
    pub fn specialist_analysis(
        structured_info: &BTreeMap<String, String>,
        chat_history: &[ChatMessage],
        dependency: Option<(Role, &str)>,
    ) -> String {
        let mut prompt = format!(
            "Structured case:\n{}\n\nPrevious discussion:\n{}\n",
            Self::structured_case(structured_info),
            Self::history(chat_history)
        );

        if let Some((role, opinion)) = dependency {
            prompt.push_str(&format!("\nCurrent {} opinion:\n{}\n", role.as_str(), opinion));
        }

        prompt.push_str(
            r#"
Give your detailed specialist analysis:
1. Key findings in your field
2. Interpretation and differential diagnosis
3. Recommendations and further investigations"#,
        );
        prompt
    }

    pub fn specialist_summary(analysis: &str) -> String {
        format!(
            r#"Detailed analysis:
{}

Condense the analysis above into at most five bullet points covering your main
conclusion, its confidence, and your key recommendation. No preamble."#,
            analysis
        )
    }

    // ==================== Conflict Detector ====================

    pub fn conflict_system() -> &'static str {
        r#"You audit a multidisciplinary team for contradictions between specialists.
You only report genuine disagreements about facts, interpretations or management,
not differences in emphasis."#
    }

    pub fn conflict_prompt(summaries: &BTreeMap<Role, String>) -> String {
        let body = summaries
            .iter()
            .map(|(role, summary)| format!("[{}]\n{}", role.as_str(), summary))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            r#"Specialist summaries:
{}

Compare the summaries and answer with a JSON object:
{{"conflicts": [{{"issue": "short title", "description": "who says what", "severity": "warning"}}]}}

Use an empty list when the specialists agree."#,
            body
        )
    }

    // ==================== Discussion ====================

    pub fn discussion_system() -> &'static str {
        r#"You chair the discussion of a multidisciplinary team.
Given the specialists' opinions and the detected conflicts, you reconcile them into consensus notes.
When a conflict cannot be settled, say which additional evidence would settle it."#
    }

    pub fn discussion_prompt(
        case_text: &str,
        opinions: &BTreeMap<Role, String>,
        conflicts: &[Conflict],
    ) -> String {
        let opinions = opinions
            .iter()
            .map(|(role, opinion)| format!("[{}]\n{}", role.as_str(), opinion))
            .collect::<Vec<_>>()
            .join("\n\n");
        let conflicts = serde_json::to_string_pretty(conflicts).unwrap_or_default();

        format!(
            r#"Case:
{}

Specialist opinions:
{}

Detected conflicts:
{}

Some conflict records may only state that detection was skipped or found nothing.
Decide whether real reconciliation is needed, then write the consensus notes,
naming the specialists whose positions you reconcile."#,
            case_text,
            if opinions.is_empty() { NOT_AVAILABLE.to_string() } else { opinions },
            conflicts
        )
    }

    // ==================== Moderator ====================

    pub fn moderator_system() -> &'static str {
        r#"You are the moderator of a respiratory multidisciplinary team.
You integrate the specialists' opinions and the team discussion into one clinical position,
and you communicate it clearly to the referring clinician."#
    }

    pub fn moderator_synthesis(
        structured_info: &BTreeMap<String, String>,
        chat_history: &[ChatMessage],
        opinions: &BTreeMap<Role, String>,
        discussion_notes: &str,
    ) -> String {
        let opinions = opinions
            .iter()
            .map(|(role, opinion)| format!("[{}]\n{}", role.as_str(), opinion))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Structured case:
{}

Previous discussion:
{}

Specialist opinions this round:
{}

Team discussion notes:
{}

Write the internal MDT summary:
1. Working diagnosis and confidence
2. Points of agreement and unresolved disagreement
3. Management plan and follow-up"#,
            Self::structured_case(structured_info),
            Self::history(chat_history),
            if opinions.is_empty() { NOT_AVAILABLE.to_string() } else { opinions },
            if discussion_notes.is_empty() { NOT_AVAILABLE } else { discussion_notes }
        )
    }

    /// Reply to the referring clinician, from the synthesis and prior dialogue only.
    pub fn moderator_reply(synthesis: &str, dialogue: &[&ChatMessage]) -> String {
        let dialogue = dialogue
            .iter()
            .map(|m| {
                let speaker = if m.is_user() { "Referring clinician" } else { "MDT" };
                format!("{}: {}", speaker, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Internal MDT summary:
{}

Conversation so far:
{}

Answer the referring clinician's latest message, based on the MDT summary.
Match their register, be direct about uncertainty, and list any information the team still needs."#,
            synthesis,
            if dialogue.is_empty() { NO_HISTORY.to_string() } else { dialogue }
        )
    }

    // ==================== Helpers ====================

    pub fn structured_case(structured_info: &BTreeMap<String, String>) -> String {
        if structured_info.is_empty() {
            return NOT_AVAILABLE.to_string();
        }
        serde_json::to_string_pretty(structured_info).unwrap_or_default()
    }

    pub fn history(chat_history: &[ChatMessage]) -> String {
        if chat_history.is_empty() {
            return NO_HISTORY.to_string();
        }
        chat_history
            .iter()
            .map(|m| format!("[{}]: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
