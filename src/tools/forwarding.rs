//! URL forwarding tools.

use rmcp::model::Tool;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::cache::CacheCategory;
use crate::gateway::ApiGateway;
use crate::tools::{checked_domain, checked_record_id, checked_text, parse_args, tool};
use crate::validate::sanitize_string;

/// Redirect kind for a URL forward.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ForwardType {
    Temporary,
    Permanent,
}

impl ForwardType {
    fn as_str(self) -> &'static str {
        match self {
            ForwardType::Temporary => "temporary",
            ForwardType::Permanent => "permanent",
        }
    }
}

pub(crate) fn tools() -> Vec<Tool> {
    vec![
        tool(
            "add_url_forward",
            "Add a URL forward for a domain or subdomain.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "subdomain": {"type": "string", "description": "Subdomain to forward; omit for the apex"},
                    "location": {"type": "string", "description": "Destination URL"},
                    "type": {"type": "string", "enum": ["temporary", "permanent"]},
                    "include_path": {"type": "boolean", "description": "Forward the request path to the destination"},
                    "wildcard": {"type": "boolean", "description": "Also forward all subdomains"}
                },
                "required": ["domain", "location", "type", "include_path"]
            }),
        ),
        tool(
            "get_url_forwards",
            "List the URL forwards configured for a domain. Cached.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"}
                },
                "required": ["domain"]
            }),
        ),
        tool(
            "delete_url_forward",
            "Delete a URL forward by its record ID.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "record_id": {"type": "string", "description": "Forward record ID from get_url_forwards"}
                },
                "required": ["domain", "record_id"]
            }),
        ),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AddUrlForwardArgs {
    domain: String,
    subdomain: Option<String>,
    location: String,
    #[serde(rename = "type")]
    forward_type: ForwardType,
    include_path: bool,
    wildcard: Option<bool>,
}

pub(crate) async fn add_url_forward(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: AddUrlForwardArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    let location = checked_text("location", &args.location)?;
    let subdomain = args
        .subdomain
        .as_deref()
        .map(|s| sanitize_string(s, 255))
        .unwrap_or_default();

    // The upstream wire format wants yes/no strings for booleans
    let mut payload = Map::new();
    payload.insert("subdomain".to_string(), json!(subdomain));
    payload.insert("location".to_string(), json!(location));
    payload.insert("type".to_string(), json!(args.forward_type.as_str()));
    payload.insert(
        "includePath".to_string(),
        json!(if args.include_path { "yes" } else { "no" }),
    );
    payload.insert(
        "wildcard".to_string(),
        json!(if args.wildcard.unwrap_or(false) { "yes" } else { "no" }),
    );

    let result = gw
        .call(
            &format!("domain/addUrlForward/{}", args.domain),
            "domain/addUrlForward",
            payload,
            None,
        )
        .await?;
    gw.invalidate_domain(&args.domain).await;
    Ok(result)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DomainArgs {
    domain: String,
}

pub(crate) async fn get_url_forwards(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: DomainArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    gw.call(
        &format!("domain/getUrlForwarding/{}", args.domain),
        "domain/getUrlForwarding",
        Map::new(),
        Some(CacheCategory::Default),
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteUrlForwardArgs {
    domain: String,
    record_id: String,
}

pub(crate) async fn delete_url_forward(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: DeleteUrlForwardArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    checked_record_id(&args.record_id)?;
    let result = gw
        .call(
            &format!("domain/deleteUrlForward/{}/{}", args.domain, args.record_id),
            "domain/deleteUrlForward",
            Map::new(),
            None,
        )
        .await?;
    gw.invalidate_domain(&args.domain).await;
    Ok(result)
}
