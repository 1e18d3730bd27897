pub mod schema;

pub use schema::{
    Config, GatewayConfig, LlmConfig, ProviderKind, SessionConfig, StorageBackend, StorageConfig,
};
