use super::types::PromptMessage;
use crate::error::GenerationError;
use std::future::Future;
use std::pin::Pin;

pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;

/// Black-box text generation: ordered messages in, text out.
///
/// Implementations fail with [`GenerationError`] on transport faults,
/// timeouts, or structurally empty output. Returned text is trimmed and
/// non-empty.
pub trait Generator: Send + Sync {
    /// Generator identifier used in logs and errors.
    fn name(&self) -> &str;

    fn generate<'a>(&'a self, messages: &'a [PromptMessage]) -> GenerateFuture<'a>;
}
