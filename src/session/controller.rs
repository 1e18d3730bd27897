use super::answer::build_final;
use super::compaction::compact;
use super::decision::{DecisionInput, decide};
use super::fallback::parse_failure_reply;
use super::incident::parse_incident;
use super::limits::{MAX_MESSAGE_CHARS, MAX_QUESTION_CHARS};
use super::memory::update_memory;
use super::registry::SessionRegistry;
use super::store::SessionStore;
use super::types::{Decision, StoredState, Turn, TurnOutcome, TurnReply};
use crate::config::SessionConfig;
use crate::error::{SreError, ValidationError};
use crate::llm::Generator;
use crate::prompt::PromptLibrary;
use crate::utils::text::clamp_text;
use std::sync::Arc;

/// Runs one conversational turn per call: load, compact, parse, decide,
/// answer or clarify, remember, persist.
///
/// Turns for the same session id are serialized; distinct sessions run
/// concurrently.
pub struct SessionController {
    generator: Arc<dyn Generator>,
    store: Arc<dyn SessionStore>,
    prompts: PromptLibrary,
    registry: SessionRegistry,
    policy: SessionConfig,
    debug: bool,
}

impl SessionController {
    pub fn new(
        generator: Arc<dyn Generator>,
        store: Arc<dyn SessionStore>,
        policy: SessionConfig,
    ) -> Result<Self, SreError> {
        Ok(Self {
            generator,
            store,
            prompts: PromptLibrary::new()?,
            registry: SessionRegistry::new(),
            policy,
            debug: false,
        })
    }

    /// Append internal error text to parse-failure replies.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn policy(&self) -> &SessionConfig {
        &self.policy
    }

    /// Read-only view of a session's stored state.
    pub async fn snapshot(&self, session_id: &str) -> Result<Option<StoredState>, SreError> {
        Ok(self.store.get(session_id).await?)
    }

    pub async fn handle_turn(&self, session_id: &str, message: &str) -> Result<TurnReply, SreError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ValidationError::MissingMessage.into());
        }

        let _guard = self.registry.acquire(session_id).await;

        let mut state = self.store.get(session_id).await?.unwrap_or_default();
        state
            .messages
            .push(Turn::user(clamp_text(message, MAX_MESSAGE_CHARS)));

        let compaction = compact(
            self.generator.as_ref(),
            &self.prompts,
            &mut state,
            &self.policy,
        )
        .await;
        tracing::debug!(session_id, ?compaction, "compaction checked");

        let incident =
            match parse_incident(self.generator.as_ref(), &self.prompts, message).await {
                Ok(incident) => incident,
                Err(err) => {
                    tracing::error!(session_id, stage = "parse", error = %err, "incident parse failed");
                    let reply = parse_failure_reply(&err, self.debug);
                    return self
                        .finish(session_id, state, reply, TurnOutcome::ParseFallback)
                        .await;
                }
            };

        let mut decision = decide(
            self.generator.as_ref(),
            &self.prompts,
            &DecisionInput {
                user_message: message,
                incident: &incident,
                profile: &state.profile,
                summary: &state.summary,
                clarifying_questions_asked: state.clarifying_questions_asked,
                max_clarifying_questions: self.policy.max_clarifying_questions,
            },
        )
        .await;

        if state.clarifying_questions_asked >= self.policy.max_clarifying_questions
            && matches!(decision, Decision::Clarify { .. })
        {
            tracing::info!(
                session_id,
                asked = state.clarifying_questions_asked,
                "clarification cap reached, finalizing"
            );
            decision = Decision::Final;
        }

        match decision {
            Decision::Clarify { question } => {
                let question = clamp_text(&question, MAX_QUESTION_CHARS);
                state.clarifying_questions_asked = state
                    .clarifying_questions_asked
                    .saturating_add(1)
                    .min(self.policy.max_clarifying_questions);
                self.finish(session_id, state, question, TurnOutcome::Clarify)
                    .await
            }
            Decision::Final => {
                let keep = self.policy.keep_last_messages;
                let recent_start = state.messages.len().saturating_sub(keep);
                let answer = build_final(
                    self.generator.as_ref(),
                    &self.prompts,
                    &incident,
                    &state.profile,
                    &state.summary,
                    &state.messages[recent_start..],
                )
                .await;

                state.messages.push(Turn::assistant(answer.clone()));

                let memory = update_memory(
                    self.generator.as_ref(),
                    &self.prompts,
                    &state.profile,
                    &incident,
                    &answer,
                    &state.summary,
                )
                .await;
                match memory {
                    Ok(update) => {
                        state.profile = update.profile;
                        state.last_incident_summary = update.last_incident_summary;
                    }
                    Err(err) => {
                        tracing::warn!(
                            session_id,
                            stage = "memory",
                            error = %err,
                            "memory update failed, keeping previous profile"
                        );
                    }
                }
                state.clarifying_questions_asked = 0;

                self.persist(session_id, &state).await?;
                tracing::info!(session_id, outcome = TurnOutcome::Final.as_str(), "turn complete");
                Ok(TurnReply {
                    reply: answer,
                    profile: state.profile,
                    outcome: TurnOutcome::Final,
                })
            }
        }
    }

    /// Append `reply` as the assistant turn, persist, and build the response.
    async fn finish(
        &self,
        session_id: &str,
        mut state: StoredState,
        reply: String,
        outcome: TurnOutcome,
    ) -> Result<TurnReply, SreError> {
        state.messages.push(Turn::assistant(reply.clone()));
        self.persist(session_id, &state).await?;
        tracing::info!(session_id, outcome = outcome.as_str(), "turn complete");
        Ok(TurnReply {
            reply,
            profile: state.profile,
            outcome,
        })
    }

    async fn persist(&self, session_id: &str, state: &StoredState) -> Result<(), SreError> {
        self.store.put(session_id, state).await.map_err(|err| {
            tracing::error!(session_id, error = %err, "failed to persist session state");
            SreError::from(err)
        })
    }
}
