//! BurrowMcpServer — rmcp ServerHandler backed by a ToolDispatcher.
//!
//! The dispatcher is stored behind an Arc<RwLock<Arc<ToolDispatcher>>> to
//! support hot-reload: the reload task swaps the inner Arc<ToolDispatcher>
//! while all sessions share the outer Arc<RwLock<...>>, so they see the
//! updated gateway on their next tool call. The tool catalog itself is
//! static — only governance settings (base URL, limits, TTLs) change on
//! reload.

use std::sync::Arc;

use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ErrorData as McpError;
use tokio::sync::RwLock;

use crate::tools::ToolDispatcher;

/// MCP server exposing the governed registrar tool catalog.
///
/// `StreamableHttpService` calls the factory closure per session — each new
/// `BurrowMcpServer` clone shares the same outer `Arc`, so hot-reload
/// propagates to all sessions automatically.
#[derive(Clone)]
pub struct BurrowMcpServer {
    /// Double-arc dispatcher handle: outer Arc<RwLock<...>> shared by all
    /// clones; inner Arc<ToolDispatcher> swapped by hot-reload on config
    /// changes.
    dispatcher: Arc<RwLock<Arc<ToolDispatcher>>>,
}

impl BurrowMcpServer {
    /// Create a new BurrowMcpServer wrapping a ToolDispatcher.
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(RwLock::new(Arc::new(dispatcher))),
        }
    }

    /// Return the dispatcher handle for the hot-reload task to swap the inner
    /// dispatcher.
    pub fn dispatcher_handle(&self) -> Arc<RwLock<Arc<ToolDispatcher>>> {
        self.dispatcher.clone()
    }
}

impl ServerHandler for BurrowMcpServer {
    /// Return server metadata: name "burrow", tool capabilities enabled.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "burrow".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Burrow — governed tool access to the Porkbun registrar API: domains, DNS, \
                 nameservers, URL forwarding, glue records, DNSSEC, and SSL bundles. Call \
                 set_credentials before anything that reaches the upstream API."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    /// List the static tool catalog.
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: ToolDispatcher::catalog(),
            next_cursor: None,
            meta: None,
        })
    }

    /// Call a tool by name, routing through the current dispatcher.
    ///
    /// Governed failures (validation, rate limit, transport, upstream) come
    /// back as error replies with a kind tag — only an unknown tool name is a
    /// protocol-level error.
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let dispatcher = self.dispatcher.read().await.clone();
        dispatcher
            .dispatch(&request.name, request.arguments)
            .await
            .ok_or_else(|| {
                McpError::invalid_params(format!("unknown tool '{}'", request.name), None)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BurrowConfig;
    use crate::credentials::CredentialStore;
    use crate::gateway::ApiGateway;
    use crate::tools::CredentialPersist;

    fn make_server() -> BurrowMcpServer {
        let config = BurrowConfig::from_toml(
            r#"
            [api]
            base_url = "http://127.0.0.1:1"
            request_timeout_secs = 2
            connect_timeout_secs = 1
            "#,
        )
        .unwrap();
        let gateway =
            ApiGateway::from_config(&config, Arc::new(CredentialStore::new())).unwrap();
        let dispatcher = ToolDispatcher::new(
            Arc::new(gateway),
            CredentialPersist {
                path: std::env::temp_dir().join("burrow-test-credentials.enc.json"),
                passphrase: None,
            },
        );
        BurrowMcpServer::new(dispatcher)
    }

    #[test]
    fn test_get_info_server_name() {
        let server = make_server();
        let info = server.get_info();
        assert_eq!(info.server_info.name, "burrow");
        assert!(
            info.capabilities.tools.is_some(),
            "tools capability should be enabled"
        );
        assert!(info.instructions.is_some(), "instructions should be set");
    }

    #[test]
    fn test_dispatcher_handle_is_shared() {
        // Both the server clone and the handle share the same outer Arc
        let server = make_server();
        let handle = server.dispatcher_handle();
        let server_clone = server.clone();

        assert!(Arc::ptr_eq(&server.dispatcher, &handle));
        assert!(Arc::ptr_eq(&server.dispatcher, &server_clone.dispatcher));
    }

    #[tokio::test]
    async fn test_swapped_dispatcher_visible_to_existing_clones() {
        let server = make_server();
        let clone = server.clone();
        let handle = server.dispatcher_handle();
        let original = handle.read().await.clone();

        let replacement = {
            let gateway_credentials = original.gateway().credentials();
            let config = BurrowConfig::from_toml(
                r#"
                [api]
                base_url = "http://127.0.0.1:2"
                "#,
            )
            .unwrap();
            let gateway = ApiGateway::from_config(&config, gateway_credentials).unwrap();
            ToolDispatcher::new(
                Arc::new(gateway),
                CredentialPersist {
                    path: std::env::temp_dir().join("burrow-test-credentials.enc.json"),
                    passphrase: None,
                },
            )
        };

        {
            let mut guard = handle.write().await;
            *guard = Arc::new(replacement);
        }

        // The pre-existing clone observes the swap on its next access
        let seen_by_clone = clone.dispatcher.read().await.clone();
        assert!(
            !Arc::ptr_eq(&seen_by_clone, &original),
            "clone should see the swapped-in dispatcher"
        );
    }
}
