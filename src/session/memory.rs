use super::limits::{
    MAX_DOMAIN_CHARS, MAX_INCIDENT_SUMMARY_CHARS, MAX_NOTES_CHARS, MAX_TECH_STACK_ITEMS,
};
use super::types::{IncidentParse, UserProfile};
use crate::error::StageError;
use crate::extract::extract_structured;
use crate::llm::{Generator, PromptMessage};
use crate::prompt::{MemoryPromptArgs, PromptLibrary};
use crate::utils::text::{clamp_text, truncate_chars};
use serde_json::Value;

/// Profile and incident summary produced after a final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryUpdate {
    pub profile: UserProfile,
    pub last_incident_summary: String,
}

/// Append `incoming` to `existing`, dropping exact duplicates while keeping
/// first-seen order, then cap the list.
pub fn merge_tech_stack(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + incoming.len());
    for item in existing.iter().chain(incoming) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged.truncate(MAX_TECH_STACK_ITEMS);
    merged
}

fn str_field<'v>(obj: Option<&'v Value>, key: &str) -> &'v str {
    obj.and_then(|o| o.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Merge generator output into the current profile.
///
/// The tech stack is additive; domain and notes are replaced wholesale
/// (an absent value clears them).
pub fn merge_memory(current: &UserProfile, output: &Value) -> MemoryUpdate {
    let proposed = output.get("profile");
    let incoming: Vec<String> = proposed
        .and_then(|p| p.get("techStack"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    MemoryUpdate {
        profile: UserProfile {
            tech_stack: merge_tech_stack(&current.tech_stack, &incoming),
            domain: truncate_chars(str_field(proposed, "domain"), MAX_DOMAIN_CHARS),
            notes: truncate_chars(str_field(proposed, "notes"), MAX_NOTES_CHARS),
        },
        last_incident_summary: clamp_text(
            str_field(Some(output), "lastIncidentSummary"),
            MAX_INCIDENT_SUMMARY_CHARS,
        ),
    }
}

/// Fold the finished incident into long-term memory.
///
/// On error the caller keeps the previous profile and incident summary.
pub async fn update_memory(
    generator: &dyn Generator,
    prompts: &PromptLibrary,
    profile: &UserProfile,
    incident: &IncidentParse,
    final_answer: &str,
    summary: &str,
) -> Result<MemoryUpdate, StageError> {
    let prompt = prompts.memory_update(&MemoryPromptArgs {
        profile,
        incident,
        final_answer,
        summary,
    })?;
    let messages = [
        PromptMessage::system(prompts.system_prompt()),
        PromptMessage::user(prompt),
    ];
    let output = extract_structured(generator, &messages).await?;
    Ok(merge_memory(profile, &output))
}
