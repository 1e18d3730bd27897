use super::super::{GatewayConfig, LlmConfig, SessionConfig, StorageConfig};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Append a short diagnostic to fallback replies.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Directory holding `config.toml`; relative paths resolve against it.
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default()
    }

    /// Resolved SQLite database path.
    pub fn storage_path(&self) -> PathBuf {
        match &self.storage.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.config_dir().join(path),
            None => self.config_dir().join("sessions.db"),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let session = &self.session;
        if session.keep_last_messages == 0 {
            return Err(ConfigError::Validation(
                "session.keep_last_messages must be at least 1".into(),
            ));
        }
        if session.keep_last_messages > session.max_messages_before_summary {
            return Err(ConfigError::Validation(format!(
                "session.keep_last_messages ({}) must not exceed session.max_messages_before_summary ({})",
                session.keep_last_messages, session.max_messages_before_summary
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "llm.timeout_secs must be at least 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Validation(format!(
                "llm.temperature {} is outside 0.0..=2.0",
                self.llm.temperature
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation("llm.model must not be empty".into()));
        }
        Ok(())
    }
}
