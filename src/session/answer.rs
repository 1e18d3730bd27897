use super::fallback::FINAL_ANSWER_FALLBACK;
use super::types::{IncidentParse, Turn, UserProfile, turn_views};
use crate::error::StageError;
use crate::llm::{Generator, PromptMessage};
use crate::prompt::{FinalAnswerPromptArgs, PromptLibrary};

async fn generate_answer(
    generator: &dyn Generator,
    prompts: &PromptLibrary,
    incident: &IncidentParse,
    profile: &UserProfile,
    summary: &str,
    recent: &[Turn],
) -> Result<String, StageError> {
    let recent_messages = turn_views(recent);
    let prompt = prompts.final_answer(&FinalAnswerPromptArgs {
        incident,
        profile,
        summary,
        recent_messages: &recent_messages,
    })?;
    let messages = [
        PromptMessage::system(prompts.system_prompt()),
        PromptMessage::user(prompt),
    ];
    Ok(generator.generate(&messages).await?)
}

/// Produce the final three-section response.
///
/// `recent` should already be limited to the retained window. Falls back to
/// a generic checklist on failure; never fails.
pub async fn build_final(
    generator: &dyn Generator,
    prompts: &PromptLibrary,
    incident: &IncidentParse,
    profile: &UserProfile,
    summary: &str,
    recent: &[Turn],
) -> String {
    match generate_answer(generator, prompts, incident, profile, summary, recent).await {
        Ok(answer) => answer,
        Err(err) => {
            tracing::warn!(stage = "answer", error = %err, "final answer generation failed");
            FINAL_ANSWER_FALLBACK.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedGenerator;
    use crate::session::fallback::has_answer_sections;

    #[tokio::test]
    async fn generated_answer_is_returned() {
        let text = "RUNBOOK (3-7 steps)\n- a\nLIKELY ROOT CAUSES (3 items, each with confidence like 0.55)\n- b (0.5)\nSTATUS UPDATE (1-2 paragraphs)\nok";
        let generator = ScriptedGenerator::from_texts([text]);
        let prompts = PromptLibrary::new().unwrap();
        let recent = [Turn::user("502s everywhere")];

        let answer = build_final(
            &generator,
            &prompts,
            &IncidentParse::default(),
            &UserProfile::default(),
            "",
            &recent,
        )
        .await;

        assert_eq!(answer, text);
        assert!(generator.calls()[0][1].content.contains("502s everywhere"));
    }

    #[tokio::test]
    async fn failure_returns_structured_fallback() {
        let generator = ScriptedGenerator::new([Err("timeout".to_string())]);
        let prompts = PromptLibrary::new().unwrap();

        let answer = build_final(
            &generator,
            &prompts,
            &IncidentParse::default(),
            &UserProfile::default(),
            "",
            &[],
        )
        .await;

        assert_eq!(answer, FINAL_ANSWER_FALLBACK);
        assert!(has_answer_sections(&answer));
    }
}
