//! MCP-facing surface: the rmcp server handler and config hot-reload.

pub mod hot_reload;
pub mod server;

pub use hot_reload::run_hot_reload;
pub use server::BurrowMcpServer;
