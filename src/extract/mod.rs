//! Structured-output extraction.
//!
//! Two layers: [`parse_structured`] validates raw generator text into a JSON
//! object, and [`extract_structured`] owns the retry policy (one correction
//! round trip, never more).

use crate::error::{SchemaError, StageError};
use crate::llm::{Generator, MessageRole, PromptMessage};
use crate::prompt::{JSON_CORRECTION_PROMPT, SYSTEM_PROMPT};
use crate::utils::text::clamp_text;
use serde_json::Value;

/// Raw output is clamped to this many characters before it is logged.
const LOGGED_OUTPUT_CHARS: usize = 500;

/// Remove a leading ```` ``` ```` / ```` ```json ```` fence and a trailing
/// ```` ``` ````. The language tag is matched case-insensitively.
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        let rest = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        body = rest.trim_start();
    }

    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

fn parse_object(candidate: &str) -> Result<Value, SchemaError> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(SchemaError::NoJsonObject),
        Err(e) => Err(SchemaError::InvalidJson(e.to_string())),
    }
}

/// Validate generator text as a JSON object.
///
/// Tries the whole (unfenced) string first, then the slice from the first
/// `{` to the last `}`.
pub fn parse_structured(text: &str) -> Result<Value, SchemaError> {
    let unfenced = strip_code_fence(text);

    if let Ok(value) = parse_object(unfenced) {
        return Ok(value);
    }

    let (Some(open), Some(close)) = (unfenced.find('{'), unfenced.rfind('}')) else {
        return Err(SchemaError::NoJsonObject);
    };
    if close <= open {
        return Err(SchemaError::NoJsonObject);
    }

    parse_object(&unfenced[open..=close])
}

/// Messages for the single correction attempt: the original system message
/// (or the default one) followed by the correction instruction and the
/// previous raw output.
fn correction_messages(messages: &[PromptMessage], previous: &str) -> [PromptMessage; 2] {
    let system = messages
        .iter()
        .find(|m| m.role == MessageRole::System)
        .cloned()
        .unwrap_or_else(|| PromptMessage::system(SYSTEM_PROMPT));

    [
        system,
        PromptMessage::user(format!("{JSON_CORRECTION_PROMPT}{previous}")),
    ]
}

/// Generate, validate, and retry once with a correction prompt.
///
/// Generation errors propagate immediately from either call. At most two
/// generator calls are made.
pub async fn extract_structured(
    generator: &dyn Generator,
    messages: &[PromptMessage],
) -> Result<Value, StageError> {
    let first = generator.generate(messages).await?;

    let err = match parse_structured(&first) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    tracing::warn!(
        provider = generator.name(),
        error = %err,
        raw = %clamp_text(&first, LOGGED_OUTPUT_CHARS),
        "structured output parse failed, retrying once"
    );

    let retry = correction_messages(messages, &first);
    let second = generator.generate(&retry).await?;

    parse_structured(&second).map_err(|err| {
        tracing::warn!(
            provider = generator.name(),
            error = %err,
            raw = %clamp_text(&second, LOGGED_OUTPUT_CHARS),
            "structured output still invalid after retry"
        );
        StageError::Schema(err)
    })
}
