//! DNSSEC delegation-signer record tools.

use rmcp::model::Tool;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::cache::CacheCategory;
use crate::error::BurrowError;
use crate::gateway::ApiGateway;
use crate::tools::{checked_domain, checked_text, parse_args, tool};

pub(crate) fn tools() -> Vec<Tool> {
    vec![
        tool(
            "create_dnssec_record",
            "Create a DNSSEC delegation-signer record at the registry.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "key_tag": {"type": "string", "description": "DS key tag"},
                    "alg": {"type": "string", "description": "DS signing algorithm number"},
                    "digest_type": {"type": "string", "description": "DS digest type number"},
                    "digest": {"type": "string", "description": "DS digest"},
                    "max_sig_life": {"type": "integer", "description": "Maximum signature lifetime in seconds"}
                },
                "required": ["domain", "key_tag", "alg", "digest_type", "digest"]
            }),
        ),
        tool(
            "get_dnssec_records",
            "List the DNSSEC records published at the registry for a domain. Cached.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"}
                },
                "required": ["domain"]
            }),
        ),
        tool(
            "delete_dnssec_record",
            "Delete a DNSSEC record at the registry by key tag.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "key_tag": {"type": "string"}
                },
                "required": ["domain", "key_tag"]
            }),
        ),
    ]
}

fn checked_key_tag(key_tag: &str) -> crate::Result<()> {
    if !key_tag.is_empty() && key_tag.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(BurrowError::Validation {
            field: "key_tag".to_string(),
            reason: format!("Invalid key tag '{key_tag}'"),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateDnssecArgs {
    domain: String,
    key_tag: String,
    alg: String,
    digest_type: String,
    digest: String,
    max_sig_life: Option<u64>,
}

pub(crate) async fn create_dnssec_record(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: CreateDnssecArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    checked_key_tag(&args.key_tag)?;
    let alg = checked_text("alg", &args.alg)?;
    let digest_type = checked_text("digest_type", &args.digest_type)?;
    let digest = checked_text("digest", &args.digest)?;

    let mut payload = Map::new();
    payload.insert("keyTag".to_string(), json!(args.key_tag));
    payload.insert("alg".to_string(), json!(alg));
    payload.insert("digestType".to_string(), json!(digest_type));
    payload.insert("digest".to_string(), json!(digest));
    if let Some(max_sig_life) = args.max_sig_life {
        payload.insert("maxSigLife".to_string(), json!(max_sig_life));
    }

    let result = gw
        .call(
            &format!("domain/createDnssecRecord/{}", args.domain),
            "domain/createDnssecRecord",
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

pub(crate) async fn get_dnssec_records(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: DomainArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    gw.call(
        &format!("domain/getDnssecRecords/{}", args.domain),
        "domain/getDnssecRecords",
        Map::new(),
        Some(CacheCategory::Default),
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteDnssecArgs {
    domain: String,
    key_tag: String,
}

pub(crate) async fn delete_dnssec_record(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: DeleteDnssecArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    checked_key_tag(&args.key_tag)?;
    let result = gw
        .call(
            &format!(
                "domain/deleteDnssecRecord/{}/{}",
                args.domain, args.key_tag
            ),
            "domain/deleteDnssecRecord",
            Map::new(),
            None,
        )
        .await?;
    gw.invalidate_domain(&args.domain).await;
    Ok(result)
}
