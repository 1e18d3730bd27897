use super::traits::{GenerateFuture, Generator};
use super::types::PromptMessage;
use crate::error::GenerationError;
use std::time::Duration;

/// Generator wrapper that bounds every call with a deadline.
pub struct TimeoutGenerator {
    inner: Box<dyn Generator>,
    timeout: Duration,
}

impl TimeoutGenerator {
    pub fn new(inner: Box<dyn Generator>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl Generator for TimeoutGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn generate<'a>(&'a self, messages: &'a [PromptMessage]) -> GenerateFuture<'a> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.inner.generate(messages)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        provider = self.inner.name(),
                        timeout_secs = self.timeout.as_secs(),
                        "generation call timed out"
                    );
                    Err(GenerationError::Timeout {
                        provider: self.inner.name().to_string(),
                        secs: self.timeout.as_secs(),
                    })
                }
            }
        })
    }
}
