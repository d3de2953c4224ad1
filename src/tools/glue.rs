//! Glue record tools.
//!
//! A glue record publishes the address of a nameserver hosted under the
//! domain it serves; every IP in the provided list is validated before the
//! request is built.

use rmcp::model::Tool;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::cache::CacheCategory;
use crate::error::BurrowError;
use crate::gateway::ApiGateway;
use crate::tools::{checked_domain, checked_ips, parse_args, tool};
use crate::validate::validate_domain;

pub(crate) fn tools() -> Vec<Tool> {
    vec![
        tool(
            "create_glue_record",
            "Create a glue record for a nameserver host under the domain.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "subdomain": {"type": "string", "description": "Nameserver host label, e.g. ns1"},
                    "ips": {"type": "array", "items": {"type": "string"}, "description": "IPv4/IPv6 addresses for the host"}
                },
                "required": ["domain", "subdomain", "ips"]
            }),
        ),
        tool(
            "update_glue_record",
            "Replace the address list of an existing glue record.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "subdomain": {"type": "string"},
                    "ips": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["domain", "subdomain", "ips"]
            }),
        ),
        tool(
            "delete_glue_record",
            "Delete a glue record.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "subdomain": {"type": "string"}
                },
                "required": ["domain", "subdomain"]
            }),
        ),
        tool(
            "get_glue_records",
            "List the glue records for a domain. Cached.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"}
                },
                "required": ["domain"]
            }),
        ),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GlueWriteArgs {
    domain: String,
    subdomain: String,
    ips: Vec<String>,
}

fn checked_glue_host(domain: &str, subdomain: &str) -> crate::Result<()> {
    if subdomain.is_empty() || !validate_domain(&format!("{subdomain}.{domain}")) {
        return Err(BurrowError::Validation {
            field: "subdomain".to_string(),
            reason: format!("Invalid glue host '{subdomain}'"),
        });
    }
    Ok(())
}

async fn write_glue(
    gw: &ApiGateway,
    endpoint_op: &str,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: GlueWriteArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    checked_glue_host(&args.domain, &args.subdomain)?;
    checked_ips(&args.ips)?;

    let mut payload = Map::new();
    payload.insert("ips".to_string(), json!(args.ips));
    let result = gw
        .call(
            &format!("domain/{endpoint_op}/{}/{}", args.domain, args.subdomain),
            &format!("domain/{endpoint_op}"),
            payload,
            None,
        )
        .await?;
    gw.invalidate_domain(&args.domain).await;
    Ok(result)
}

pub(crate) async fn create_glue_record(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    write_glue(gw, "createGlue", arguments).await
}

pub(crate) async fn update_glue_record(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    write_glue(gw, "updateGlue", arguments).await
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteGlueArgs {
    domain: String,
    subdomain: String,
}

pub(crate) async fn delete_glue_record(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: DeleteGlueArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    checked_glue_host(&args.domain, &args.subdomain)?;
    let result = gw
        .call(
            &format!("domain/deleteGlue/{}/{}", args.domain, args.subdomain),
            "domain/deleteGlue",
            Map::new(),
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

pub(crate) async fn get_glue_records(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: DomainArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    gw.call(
        &format!("domain/getGlue/{}", args.domain),
        "domain/getGlue",
        Map::new(),
        Some(CacheCategory::Default),
    )
    .await
}
