use super::limits::MAX_SUMMARY_CHARS;
use super::types::{StoredState, turn_views};
use crate::config::SessionConfig;
use crate::error::StageError;
use crate::llm::{Generator, PromptMessage};
use crate::prompt::PromptLibrary;
use crate::utils::text::clamp_text;

/// Summary placeholder used when summarization fails and no summary exists.
pub const SUMMARY_UNAVAILABLE: &str =
    "Earlier conversation summarized due to length. (AI summarization unavailable.)";

/// Outcome returned after a compaction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// History was within budget; nothing changed.
    Skipped,
    /// Older turns were folded into a freshly generated summary.
    Summarized { removed: usize },
    /// Generation failed; older turns were dropped and the previous summary
    /// (or the placeholder) kept.
    Fallback { removed: usize },
}

impl CompactionOutcome {
    pub fn removed(self) -> usize {
        match self {
            Self::Skipped => 0,
            Self::Summarized { removed } | Self::Fallback { removed } => removed,
        }
    }
}

async fn summarize(
    generator: &dyn Generator,
    prompts: &PromptLibrary,
    state: &StoredState,
    split: usize,
) -> Result<String, StageError> {
    let older = turn_views(&state.messages[..split]);
    let prompt = prompts.summarize(&state.summary, &older)?;
    let messages = [
        PromptMessage::system(prompts.system_prompt()),
        PromptMessage::user(prompt),
    ];
    Ok(generator.generate(&messages).await?)
}

/// Fold turns older than the retained window into the running summary.
///
/// Only `summary` and `messages` are touched. Truncation to the last
/// `keep_last_messages` turns happens whether or not summarization succeeds.
pub async fn compact(
    generator: &dyn Generator,
    prompts: &PromptLibrary,
    state: &mut StoredState,
    policy: &SessionConfig,
) -> CompactionOutcome {
    let total = state.messages.len();
    if total <= policy.max_messages_before_summary {
        return CompactionOutcome::Skipped;
    }

    let split = total.saturating_sub(policy.keep_last_messages);

    let result = summarize(generator, prompts, state, split).await;
    let outcome = match result {
        Ok(summary) => {
            state.summary = clamp_text(&summary, MAX_SUMMARY_CHARS);
            CompactionOutcome::Summarized { removed: split }
        }
        Err(err) => {
            tracing::warn!(
                stage = "compaction",
                error = %err,
                "summarization failed, keeping previous summary"
            );
            let fallback = if state.summary.is_empty() {
                SUMMARY_UNAVAILABLE
            } else {
                state.summary.as_str()
            };
            state.summary = clamp_text(fallback, MAX_SUMMARY_CHARS);
            CompactionOutcome::Fallback { removed: split }
        }
    };

    state.messages.drain(..split);
    tracing::debug!(
        removed = split,
        kept = state.messages.len(),
        "session history compacted"
    );
    outcome
}
