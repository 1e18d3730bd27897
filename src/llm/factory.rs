use super::compatible::OpenAiCompatibleGenerator;
use super::http_client::build_provider_client_with_timeout;
use super::ollama::OllamaGenerator;
use super::timeout::TimeoutGenerator;
use super::traits::Generator;
use crate::config::{LlmConfig, ProviderKind};
use crate::error::ConfigError;
use std::sync::Arc;
use std::time::Duration;

/// Extra slack on the HTTP client so the generation deadline fires first.
const CLIENT_TIMEOUT_SLACK_SECS: u64 = 5;

/// Resolve the generation API key.
///
/// Resolution order:
/// 1. Explicitly configured key (trimmed, ignored if empty)
/// 2. `OPENAI_API_KEY` environment variable
pub fn resolve_api_key(explicit_api_key: Option<&str>) -> Option<String> {
    if let Some(key) = explicit_api_key.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }

    std::env::var("OPENAI_API_KEY")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Build the configured generator, wrapped with the per-call deadline.
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn Generator>, ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be greater than zero".into(),
        ));
    }

    let client =
        build_provider_client_with_timeout(config.timeout_secs + CLIENT_TIMEOUT_SLACK_SECS);

    let inner: Box<dyn Generator> = match config.provider {
        ProviderKind::OpenaiCompatible => {
            let api_key = resolve_api_key(config.api_key.as_deref());
            if api_key.is_none() {
                tracing::warn!(
                    base_url = %config.base_url,
                    "no API key configured; requests will be sent unauthenticated"
                );
            }
            Box::new(OpenAiCompatibleGenerator::new(
                &config.base_url,
                api_key.as_deref(),
                &config.model,
                config.temperature,
                client,
            ))
        }
        ProviderKind::Ollama => Box::new(OllamaGenerator::new(
            &config.base_url,
            &config.model,
            config.temperature,
            client,
        )),
    };

    tracing::debug!(
        provider = config.provider.as_str(),
        model = %config.model,
        timeout_secs = config.timeout_secs,
        "generator created"
    );

    Ok(Arc::new(TimeoutGenerator::new(
        inner,
        Duration::from_secs(config.timeout_secs),
    )))
}
