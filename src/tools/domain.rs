//! Domain listing, availability, and nameserver tools.

use rmcp::model::Tool;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::cache::CacheCategory;
use crate::error::BurrowError;
use crate::gateway::ApiGateway;
use crate::tools::{checked_domain, parse_args, tool};
use crate::validate::validate_domain;

pub(crate) fn tools() -> Vec<Tool> {
    vec![
        tool(
            "list_domains",
            "List all domains in the account. Cached.",
            json!({
                "type": "object",
                "properties": {
                    "start": {"type": "integer", "description": "Pagination offset, in steps of 1000"}
                }
            }),
        ),
        tool(
            "check_domain",
            "Check registration availability and pricing for a domain.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string", "description": "Domain to check, e.g. example.com"}
                },
                "required": ["domain"]
            }),
        ),
        tool(
            "get_nameservers",
            "Get the authoritative nameservers for a domain. Cached.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"}
                },
                "required": ["domain"]
            }),
        ),
        tool(
            "update_nameservers",
            "Replace the authoritative nameservers for a domain.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "nameservers": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Complete replacement set of nameserver hostnames"
                    }
                },
                "required": ["domain", "nameservers"]
            }),
        ),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListDomainsArgs {
    start: Option<u64>,
}

pub(crate) async fn list_domains(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: ListDomainsArgs = parse_args(arguments)?;
    let mut payload = Map::new();
    if let Some(start) = args.start {
        payload.insert("start".to_string(), json!(start));
    }
    gw.call(
        "domain/listAll",
        "domain/listAll",
        payload,
        Some(CacheCategory::Default),
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DomainArgs {
    domain: String,
}

pub(crate) async fn check_domain(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: DomainArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    gw.call(
        &format!("domain/checkDomain/{}", args.domain),
        "domain/checkDomain",
        Map::new(),
        Some(CacheCategory::Default),
    )
    .await
}

pub(crate) async fn get_nameservers(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: DomainArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    gw.call(
        &format!("domain/getNs/{}", args.domain),
        "domain/getNs",
        Map::new(),
        Some(CacheCategory::Default),
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateNameserversArgs {
    domain: String,
    nameservers: Vec<String>,
}

pub(crate) async fn update_nameservers(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: UpdateNameserversArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    if args.nameservers.is_empty() {
        return Err(BurrowError::Validation {
            field: "nameservers".to_string(),
            reason: "at least one nameserver is required".to_string(),
        });
    }
    for ns in &args.nameservers {
        if !validate_domain(ns) {
            return Err(BurrowError::Validation {
                field: "nameservers".to_string(),
                reason: format!("Invalid domain '{ns}'"),
            });
        }
    }

    let mut payload = Map::new();
    payload.insert("ns".to_string(), json!(args.nameservers));
    let result = gw
        .call(
            &format!("domain/updateNs/{}", args.domain),
            "domain/updateNs",
            payload,
            None,
        )
        .await?;
    gw.invalidate_domain(&args.domain).await;
    Ok(result)
}
