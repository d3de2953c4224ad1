//! Burrow — MCP tool server for the Porkbun registrar API.
//! Every upstream call passes through one governance path: typed argument
//! validation, a TTL response cache for idempotent reads, a per-endpoint
//! sliding-window rate limiter, and an encrypted credential store.

pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod mcp;
pub mod rate_limit;
pub mod tools;
pub mod validate;

pub use cache::{cache_key, CacheCategory, ResponseCache};
pub use config::{parse_env_ref, resolve_env_ref, BurrowConfig};
pub use credentials::{
    load_credentials, save_credentials, CredentialPair, CredentialStore, EncryptedCredentials,
};
pub use error::{BurrowError, Result};
pub use gateway::ApiGateway;
pub use mcp::hot_reload::run_hot_reload;
pub use mcp::server::BurrowMcpServer;
pub use rate_limit::RateLimiter;
pub use tools::{CredentialPersist, ToolDispatcher};
pub use validate::{
    sanitize_string, validate_domain, validate_ip, validate_record_type, RecordType,
};
