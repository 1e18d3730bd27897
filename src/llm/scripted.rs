use super::traits::{GenerateFuture, Generator};
use super::types::PromptMessage;
use crate::error::GenerationError;
use std::collections::VecDeque;
use std::sync::Mutex;

const SCRIPTED_NAME: &str = "scripted";

/// Deterministic generator that replays a queue of canned outcomes.
///
/// Each call pops the next entry: `Ok(text)` is returned as generated text,
/// `Err(message)` becomes a [`GenerationError::Request`]. An exhausted queue
/// also fails. Every message list received is recorded for inspection.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<Vec<PromptMessage>>>,
}

impl ScriptedGenerator {
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, String>>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Convenience constructor for a script made only of successful outputs.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| Ok(t.into())))
    }

    pub fn push_ok(&self, text: impl Into<String>) {
        self.lock_responses().push_back(Ok(text.into()));
    }

    pub fn push_err(&self, message: impl Into<String>) {
        self.lock_responses().push_back(Err(message.into()));
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    pub fn calls(&self) -> Vec<Vec<PromptMessage>> {
        self.lock_calls().clone()
    }

    pub fn remaining(&self) -> usize {
        self.lock_responses().len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<Vec<PromptMessage>>> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn next_outcome(&self, messages: &[PromptMessage]) -> Result<String, GenerationError> {
        self.lock_calls().push(messages.to_vec());
        match self.lock_responses().pop_front() {
            Some(Ok(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Err(GenerationError::EmptyOutput {
                        provider: SCRIPTED_NAME.to_string(),
                    })
                } else {
                    Ok(trimmed.to_string())
                }
            }
            Some(Err(message)) => Err(GenerationError::Request {
                provider: SCRIPTED_NAME.to_string(),
                message,
            }),
            None => Err(GenerationError::Request {
                provider: SCRIPTED_NAME.to_string(),
                message: "script exhausted".to_string(),
            }),
        }
    }
}

impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        SCRIPTED_NAME
    }

    fn generate<'a>(&'a self, messages: &'a [PromptMessage]) -> GenerateFuture<'a> {
        let outcome = self.next_outcome(messages);
        Box::pin(async move { outcome })
    }
}
