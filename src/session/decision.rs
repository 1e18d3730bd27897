use super::types::{Decision, IncidentParse, UserProfile};
use crate::error::StageError;
use crate::extract::extract_structured;
use crate::llm::{Generator, PromptMessage};
use crate::prompt::{DecisionPromptArgs, PromptLibrary};
use serde_json::Value;

/// Everything the decision prompt needs to know about the session.
pub struct DecisionInput<'a> {
    pub user_message: &'a str,
    pub incident: &'a IncidentParse,
    pub profile: &'a UserProfile,
    pub summary: &'a str,
    pub clarifying_questions_asked: u32,
    pub max_clarifying_questions: u32,
}

/// Convert generator output into a [`Decision`].
///
/// `None` when a clarify action carries no usable question.
pub fn to_decision(value: &Value) -> Option<Decision> {
    match value.get("action").and_then(Value::as_str) {
        Some("clarify") => {
            let question = value
                .get("question")
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default();
            (!question.is_empty()).then(|| Decision::Clarify {
                question: question.to_string(),
            })
        }
        _ => Some(Decision::Final),
    }
}

async fn request_decision(
    generator: &dyn Generator,
    prompts: &PromptLibrary,
    input: &DecisionInput<'_>,
) -> Result<Value, StageError> {
    let prompt = prompts.decision(&DecisionPromptArgs {
        user_message: input.user_message,
        incident: input.incident,
        profile: input.profile,
        summary: input.summary,
        clarifying_asked: input.clarifying_questions_asked,
        max_clarifying: input.max_clarifying_questions,
    })?;
    let messages = [
        PromptMessage::system(prompts.system_prompt()),
        PromptMessage::user(prompt),
    ];
    extract_structured(generator, &messages).await
}

/// Choose between one more clarifying question and finalizing.
///
/// Never fails: extraction errors and invalid clarify output both yield
/// [`Decision::Final`]. The clarification cap is enforced by the caller.
pub async fn decide(
    generator: &dyn Generator,
    prompts: &PromptLibrary,
    input: &DecisionInput<'_>,
) -> Decision {
    match request_decision(generator, prompts, input).await {
        Ok(value) => to_decision(&value).unwrap_or_else(|| {
            tracing::warn!(stage = "decision", "clarify decision without a question");
            Decision::Final
        }),
        Err(err) => {
            tracing::warn!(stage = "decision", error = %err, "decision failed, finalizing");
            Decision::Final
        }
    }
}
