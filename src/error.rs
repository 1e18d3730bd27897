use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Pocket SRE.
///
/// Each concern defines its own error type. The session controller matches on
/// these to pick a fallback; startup code continues to use `anyhow::Result`
/// for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum SreError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Text generation ─────────────────────────────────────────────────
    #[error("generation: {0}")]
    Generation(#[from] GenerationError),

    // ── Structured output ───────────────────────────────────────────────
    #[error("schema: {0}")]
    Schema(#[from] SchemaError),

    // ── Prompt / Template ───────────────────────────────────────────────
    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),

    // ── Request validation ──────────────────────────────────────────────
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    // ── Storage ─────────────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Generation errors ──────────────────────────────────────────────────────

/// The generation collaborator failed: transport fault, timeout, or an empty
/// payload.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} timed out after {secs}s")]
    Timeout { provider: String, secs: u64 },

    #[error("provider {provider} returned an empty or unrecognized payload")]
    EmptyOutput { provider: String },
}

// ─── Structured-output errors ───────────────────────────────────────────────

/// Generation succeeded but the output could not be read as a JSON object.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("no JSON object found in output")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

// ─── Prompt / Template errors ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("template render failed: {0}")]
    Render(String),

    #[error("template not found: {0}")]
    NotFound(String),
}

// ─── Pipeline stage errors ──────────────────────────────────────────────────

/// Failure of a single generation-backed stage (parse, decide, answer,
/// summarize, memory update). Every stage absorbs these locally.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl From<StageError> for SreError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::Generation(e) => Self::Generation(e),
            StageError::Schema(e) => Self::Schema(e),
            StageError::Prompt(e) => Self::Prompt(e),
        }
    }
}

// ─── Validation errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing message")]
    MissingMessage,

    #[error("Invalid sessionId")]
    InvalidSessionId,

    #[error("Invalid message")]
    InvalidMessage,
}

// ─── Storage errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("state encode/decode failed: {0}")]
    Codec(String),

    #[error("schema migration failed: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, SreError>;
