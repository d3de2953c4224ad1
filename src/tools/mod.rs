//! ToolDispatcher — maps each named MCP tool to a governed gateway call.
//!
//! Every tool parses a typed argument record (unknown or missing fields are
//! rejected deterministically), validates domain-shaped fields before the
//! gateway is reached, and returns exactly one structured reply: the success
//! payload as JSON content, or an error object carrying a machine-readable
//! kind tag plus a human-readable message with `is_error` set.

pub mod admin;
pub mod dns;
pub mod dnssec;
pub mod domain;
pub mod forwarding;
pub mod glue;
pub mod ssl;

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::BurrowError;
use crate::gateway::ApiGateway;
use crate::validate::{sanitize_string, validate_domain, validate_ip, RecordType};

/// Where and how `set_credentials` persists the encrypted pair.
///
/// `passphrase` is `None` when the configured env var is unset — credentials
/// then live in memory only and the reply says so.
#[derive(Debug, Clone)]
pub struct CredentialPersist {
    pub path: PathBuf,
    pub passphrase: Option<String>,
}

/// Routes named tool calls to their handlers.
pub struct ToolDispatcher {
    gateway: Arc<ApiGateway>,
    persist: CredentialPersist,
}

impl ToolDispatcher {
    pub fn new(gateway: Arc<ApiGateway>, persist: CredentialPersist) -> Self {
        Self { gateway, persist }
    }

    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    /// The full static tool catalog.
    pub fn catalog() -> Vec<Tool> {
        let mut tools = Vec::new();
        tools.extend(admin::tools());
        tools.extend(domain::tools());
        tools.extend(forwarding::tools());
        tools.extend(glue::tools());
        tools.extend(dns::tools());
        tools.extend(dnssec::tools());
        tools.extend(ssl::tools());
        tools
    }

    /// Dispatch a tool call by name. Returns `None` for unknown tool names;
    /// every governed failure becomes an error reply, never a protocol error.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Option<CallToolResult> {
        let gw = self.gateway.as_ref();
        let outcome = match name {
            "ping" => admin::ping(gw, arguments).await,
            "get_pricing" => admin::get_pricing(gw, arguments).await,
            "set_credentials" => admin::set_credentials(gw, &self.persist, arguments).await,
            "clear_cache" => admin::clear_cache(gw, arguments).await,
            "list_domains" => domain::list_domains(gw, arguments).await,
            "check_domain" => domain::check_domain(gw, arguments).await,
            "get_nameservers" => domain::get_nameservers(gw, arguments).await,
            "update_nameservers" => domain::update_nameservers(gw, arguments).await,
            "add_url_forward" => forwarding::add_url_forward(gw, arguments).await,
            "get_url_forwards" => forwarding::get_url_forwards(gw, arguments).await,
            "delete_url_forward" => forwarding::delete_url_forward(gw, arguments).await,
            "create_glue_record" => glue::create_glue_record(gw, arguments).await,
            "update_glue_record" => glue::update_glue_record(gw, arguments).await,
            "delete_glue_record" => glue::delete_glue_record(gw, arguments).await,
            "get_glue_records" => glue::get_glue_records(gw, arguments).await,
            "create_dns_record" => dns::create_dns_record(gw, arguments).await,
            "edit_dns_record" => dns::edit_dns_record(gw, arguments).await,
            "delete_dns_record" => dns::delete_dns_record(gw, arguments).await,
            "get_dns_records" => dns::get_dns_records(gw, arguments).await,
            "get_dns_records_by_type" => dns::get_dns_records_by_type(gw, arguments).await,
            "edit_dns_record_by_type" => dns::edit_dns_record_by_type(gw, arguments).await,
            "delete_dns_record_by_type" => dns::delete_dns_record_by_type(gw, arguments).await,
            "create_dnssec_record" => dnssec::create_dnssec_record(gw, arguments).await,
            "get_dnssec_records" => dnssec::get_dnssec_records(gw, arguments).await,
            "delete_dnssec_record" => dnssec::delete_dnssec_record(gw, arguments).await,
            "get_ssl_bundle" => ssl::get_ssl_bundle(gw, arguments).await,
            _ => return None,
        };
        Some(reply(outcome))
    }
}

/// Convert a handler outcome into the uniform tool reply shape.
pub(crate) fn reply(outcome: crate::Result<Value>) -> CallToolResult {
    let (payload, is_error) = match outcome {
        Ok(value) => (value, false),
        Err(e) => (
            json!({
                "error": {
                    "kind": e.kind(),
                    "message": e.to_string(),
                }
            }),
            true,
        ),
    };
    let content =
        Content::json(payload.clone()).unwrap_or_else(|_| Content::text(payload.to_string()));
    CallToolResult {
        content: vec![content],
        is_error: Some(is_error),
        structured_content: None,
        meta: None,
    }
}

/// Deserialize the MCP arguments map into a typed record.
///
/// Missing required fields and unknown fields both fail here, before any
/// cache, rate-limit, or network interaction.
pub(crate) fn parse_args<T: DeserializeOwned>(
    arguments: Option<Map<String, Value>>,
) -> crate::Result<T> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default())).map_err(|e| {
        BurrowError::Validation {
            field: "arguments".to_string(),
            reason: format!("Invalid arguments: {e}"),
        }
    })
}

/// Argument record for tools that take no arguments.
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NoArgs {}

pub(crate) fn checked_domain(domain: &str) -> crate::Result<()> {
    if validate_domain(domain) {
        Ok(())
    } else {
        Err(BurrowError::Validation {
            field: "domain".to_string(),
            reason: format!("Invalid domain '{domain}'"),
        })
    }
}

pub(crate) fn checked_record_type(record_type: &str) -> crate::Result<RecordType> {
    record_type
        .parse::<RecordType>()
        .map_err(|_| BurrowError::Validation {
            field: "type".to_string(),
            reason: format!("Invalid DNS record type '{record_type}'"),
        })
}

pub(crate) fn checked_ips(ips: &[String]) -> crate::Result<()> {
    if ips.is_empty() {
        return Err(BurrowError::Validation {
            field: "ips".to_string(),
            reason: "at least one IP address is required".to_string(),
        });
    }
    for ip in ips {
        if !validate_ip(ip) {
            return Err(BurrowError::Validation {
                field: "ips".to_string(),
                reason: format!("Invalid IP address '{ip}'"),
            });
        }
    }
    Ok(())
}

/// Record IDs on the upstream API are decimal strings.
pub(crate) fn checked_record_id(record_id: &str) -> crate::Result<()> {
    if !record_id.is_empty() && record_id.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(BurrowError::Validation {
            field: "record_id".to_string(),
            reason: format!("Invalid record ID '{record_id}'"),
        })
    }
}

/// Sanitize a required free-text field, rejecting a result that sanitizes to
/// empty.
pub(crate) fn checked_text(field: &str, value: &str) -> crate::Result<String> {
    let cleaned = sanitize_string(value, 255);
    if cleaned.is_empty() {
        return Err(BurrowError::Validation {
            field: field.to_string(),
            reason: format!("{field} must not be empty"),
        });
    }
    Ok(cleaned)
}

/// Build a tool descriptor from a name, description, and JSON schema literal.
pub(crate) fn tool(name: &str, description: &str, schema: Value) -> Tool {
    let input_schema = Arc::new(schema.as_object().cloned().unwrap_or_default());
    Tool {
        name: name.to_string().into(),
        title: None,
        description: Some(description.to_string().into()),
        input_schema,
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BurrowConfig;
    use crate::credentials::{CredentialPair, CredentialStore};
    use std::collections::HashSet;

    /// Dispatcher over a gateway pointed at an unroutable address, so any
    /// accidental network dispatch fails fast instead of hanging.
    fn offline_dispatcher(max_requests: usize) -> ToolDispatcher {
        let config = BurrowConfig::from_toml(&format!(
            r#"
            [api]
            base_url = "http://127.0.0.1:1"
            request_timeout_secs = 2
            connect_timeout_secs = 1

            [rate_limit]
            window_secs = 10
            max_requests = {max_requests}
            "#
        ))
        .unwrap();
        let gateway =
            ApiGateway::from_config(&config, Arc::new(CredentialStore::new())).unwrap();
        ToolDispatcher::new(
            Arc::new(gateway),
            CredentialPersist {
                path: std::env::temp_dir().join("burrow-test-credentials.enc.json"),
                passphrase: None,
            },
        )
    }

    fn args(value: Value) -> Option<Map<String, Value>> {
        value.as_object().cloned()
    }

    fn reply_json(result: &CallToolResult) -> String {
        serde_json::to_string(result).expect("reply serializes")
    }

    #[tokio::test]
    async fn test_unknown_tool_is_none() {
        let dispatcher = offline_dispatcher(10);
        assert!(dispatcher.dispatch("no_such_tool", None).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_record_type_rejected_before_any_consumption() {
        // Ceiling of 1: if validation consumed rate quota, the follow-up call
        // would be refused as rate-limited instead of missing-credentials.
        let dispatcher = offline_dispatcher(1);

        let result = dispatcher
            .dispatch(
                "create_dns_record",
                args(json!({"domain": "example.com", "type": "INVALID", "content": "x"})),
            )
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let text = reply_json(&result);
        assert!(text.contains("Invalid DNS record type"), "got: {text}");
        assert!(text.contains("validation"), "got: {text}");

        let followup = dispatcher.dispatch("ping", None).await.unwrap();
        assert!(
            reply_json(&followup).contains("missing_credentials"),
            "validation failure must not consume rate quota"
        );
    }

    #[tokio::test]
    async fn test_invalid_domain_rejected_everywhere() {
        let dispatcher = offline_dispatcher(10);
        for tool_name in ["get_dns_records", "check_domain", "get_ssl_bundle"] {
            let result = dispatcher
                .dispatch(tool_name, args(json!({"domain": "invalid..domain"})))
                .await
                .unwrap();
            assert_eq!(result.is_error, Some(true), "{tool_name}");
            let text = reply_json(&result);
            assert!(text.contains("Invalid domain"), "{tool_name}: {text}");
        }
    }

    #[tokio::test]
    async fn test_ping_without_credentials() {
        let dispatcher = offline_dispatcher(10);
        let result = dispatcher.dispatch("ping", None).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        let text = reply_json(&result);
        assert!(text.contains("missing_credentials"), "got: {text}");
        assert!(text.contains("set_credentials"), "got: {text}");
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_after_ceiling() {
        let dispatcher = offline_dispatcher(2);
        dispatcher
            .gateway()
            .credentials()
            .set(CredentialPair::new("pk1_abc", "sk1_def").unwrap())
            .await;

        for _ in 0..2 {
            let result = dispatcher.dispatch("ping", None).await.unwrap();
            // Upstream is unroutable, so within-quota calls fail in transport
            assert!(reply_json(&result).contains("transport"));
        }
        let result = dispatcher.dispatch("ping", None).await.unwrap();
        assert!(
            reply_json(&result).contains("rate_limited"),
            "call over the ceiling should be refused locally"
        );
    }

    #[tokio::test]
    async fn test_unknown_argument_field_rejected() {
        let dispatcher = offline_dispatcher(10);
        let result = dispatcher
            .dispatch("ping", args(json!({"bogus": 1})))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(reply_json(&result).contains("validation"));
    }

    #[tokio::test]
    async fn test_missing_required_field_rejected() {
        let dispatcher = offline_dispatcher(10);
        let result = dispatcher
            .dispatch("check_domain", None)
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(reply_json(&result).contains("validation"));
    }

    #[tokio::test]
    async fn test_missing_priority_for_mx_rejected() {
        let dispatcher = offline_dispatcher(10);
        let result = dispatcher
            .dispatch(
                "create_dns_record",
                args(json!({"domain": "example.com", "type": "MX", "content": "mail.example.com"})),
            )
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let text = reply_json(&result);
        assert!(text.contains("priority"), "got: {text}");
    }

    #[tokio::test]
    async fn test_invalid_glue_ip_rejected() {
        let dispatcher = offline_dispatcher(10);
        let result = dispatcher
            .dispatch(
                "create_glue_record",
                args(json!({
                    "domain": "example.com",
                    "subdomain": "ns1",
                    "ips": ["192.168.1.1", "256.256.256.256"]
                })),
            )
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let text = reply_json(&result);
        assert!(text.contains("Invalid IP address"), "got: {text}");
    }

    #[tokio::test]
    async fn test_clear_cache_is_local_and_always_succeeds() {
        // Works with no credentials and an unroutable upstream
        let dispatcher = offline_dispatcher(10);
        let result = dispatcher.dispatch("clear_cache", None).await.unwrap();
        assert_eq!(result.is_error, Some(false));
    }

    #[tokio::test]
    async fn test_set_credentials_requires_nonempty_fields() {
        let dispatcher = offline_dispatcher(10);
        let result = dispatcher
            .dispatch(
                "set_credentials",
                args(json!({"api_key": "", "secret_api_key": "sk1_def"})),
            )
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(reply_json(&result).contains("validation"));
    }

    #[tokio::test]
    async fn test_set_credentials_updates_store() {
        let dispatcher = offline_dispatcher(10);
        let result = dispatcher
            .dispatch(
                "set_credentials",
                args(json!({"api_key": "pk1_abc", "secret_api_key": "sk1_def"})),
            )
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        assert!(dispatcher.gateway().credentials().is_configured().await);
    }

    #[tokio::test]
    async fn test_catalog_names_unique_and_routable() {
        let dispatcher = offline_dispatcher(100);
        let catalog = ToolDispatcher::catalog();
        assert_eq!(catalog.len(), 26);

        let mut seen = HashSet::new();
        for tool in &catalog {
            assert!(seen.insert(tool.name.to_string()), "duplicate: {}", tool.name);
            assert!(
                dispatcher.dispatch(tool.name.as_ref(), None).await.is_some(),
                "cataloged tool '{}' must route",
                tool.name
            );
        }
    }

    #[tokio::test]
    async fn test_catalog_schemas_are_objects() {
        for tool in ToolDispatcher::catalog() {
            assert_eq!(
                tool.input_schema.get("type").and_then(Value::as_str),
                Some("object"),
                "tool '{}' schema must be an object schema",
                tool.name
            );
            assert!(tool.description.is_some());
        }
    }
}
