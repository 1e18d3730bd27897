// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod scrub;
pub mod traits;
pub mod types;

// ── Decorator layers ────────────────────────────────────────────────────────
pub mod factory;
pub mod timeout;

// ── Generator implementations ───────────────────────────────────────────────
pub mod compatible;
pub mod ollama;
pub mod scripted;

// ── Infrastructure re-exports ───────────────────────────────────────────────
pub use http_client::build_provider_client_with_timeout;
pub use scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
pub use traits::{GenerateFuture, Generator};
pub use types::{MessageRole, PromptMessage, payload_to_text};

// ── Generator + factory re-exports ──────────────────────────────────────────
pub use compatible::OpenAiCompatibleGenerator;
pub use factory::{create_generator, resolve_api_key};
pub use ollama::OllamaGenerator;
pub use scripted::ScriptedGenerator;
pub use timeout::TimeoutGenerator;
