use super::types::{IncidentParse, Severity};
use crate::error::StageError;
use crate::extract::extract_structured;
use crate::llm::{Generator, PromptMessage};
use crate::prompt::PromptLibrary;
use serde_json::Value;

fn string_field(obj: &Value, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Non-empty string entries of an array field; anything else is dropped.
fn string_list(obj: &Value, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Coerce loosely-shaped generator output into an [`IncidentParse`].
///
/// Never fails: missing or mistyped fields fall back to empty values, an
/// empty `type` becomes `"unknown"`, and unrecognized severities become
/// [`Severity::Unknown`].
pub fn normalize_incident(value: &Value) -> IncidentParse {
    let kind = string_field(value, "type");
    IncidentParse {
        kind: if kind.is_empty() {
            "unknown".to_string()
        } else {
            kind
        },
        severity_guess: Severity::from_loose(&string_field(value, "severity_guess")),
        timeframe: string_field(value, "timeframe"),
        symptoms: string_list(value, "symptoms"),
        stack_hints: string_list(value, "stack_hints"),
    }
}

/// Extract a normalized incident record from the raw user message.
pub async fn parse_incident(
    generator: &dyn Generator,
    prompts: &PromptLibrary,
    user_message: &str,
) -> Result<IncidentParse, StageError> {
    let messages = [
        PromptMessage::system(prompts.system_prompt()),
        PromptMessage::user(prompts.incident_parse(user_message)?),
    ];
    let value = extract_structured(generator, &messages).await?;
    Ok(normalize_incident(&value))
}
