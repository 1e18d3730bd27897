pub(crate) mod core;
mod gateway;
mod llm;
mod session;
mod storage;

pub use core::Config;
pub use gateway::GatewayConfig;
pub use llm::{LlmConfig, ProviderKind};
pub use session::SessionConfig;
pub use storage::{StorageBackend, StorageConfig};
