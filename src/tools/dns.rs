//! DNS record CRUD tools, including the by-name-and-type variants.

use rmcp::model::Tool;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::cache::CacheCategory;
use crate::error::BurrowError;
use crate::gateway::ApiGateway;
use crate::tools::{
    checked_domain, checked_record_id, checked_record_type, checked_text, parse_args, tool,
};
use crate::validate::{sanitize_string, RecordType};

fn record_schema(extra: Value, required: &[&str]) -> Value {
    let mut properties = json!({
        "domain": {"type": "string"},
        "type": {
            "type": "string",
            "enum": ["A", "MX", "CNAME", "ALIAS", "TXT", "NS", "AAAA", "SRV", "TLSA", "CAA", "HTTPS", "SVCB"]
        },
        "name": {"type": "string", "description": "Subdomain label; omit or empty for the apex"},
        "content": {"type": "string", "description": "Record content"},
        "prio": {"type": "integer", "description": "Priority; required for MX and SRV"},
        "ttl": {"type": "integer", "description": "TTL in seconds"}
    });
    if let (Some(props), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            props.insert(k.clone(), v.clone());
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

pub(crate) fn tools() -> Vec<Tool> {
    vec![
        tool(
            "create_dns_record",
            "Create a DNS record for a domain.",
            record_schema(json!({}), &["domain", "type", "content"]),
        ),
        tool(
            "edit_dns_record",
            "Edit a DNS record by its record ID.",
            record_schema(
                json!({"record_id": {"type": "string"}}),
                &["domain", "record_id", "type", "content"],
            ),
        ),
        tool(
            "delete_dns_record",
            "Delete a DNS record by its record ID.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "record_id": {"type": "string"}
                },
                "required": ["domain", "record_id"]
            }),
        ),
        tool(
            "get_dns_records",
            "List DNS records for a domain, or a single record by ID. Cached briefly.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "record_id": {"type": "string", "description": "Restrict to a single record"}
                },
                "required": ["domain"]
            }),
        ),
        tool(
            "get_dns_records_by_type",
            "List DNS records matching a type and optional subdomain. Cached briefly.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "type": {"type": "string"},
                    "subdomain": {"type": "string"}
                },
                "required": ["domain", "type"]
            }),
        ),
        tool(
            "edit_dns_record_by_type",
            "Replace the records matching a type and optional subdomain.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "type": {"type": "string"},
                    "subdomain": {"type": "string"},
                    "content": {"type": "string"},
                    "prio": {"type": "integer"},
                    "ttl": {"type": "integer"}
                },
                "required": ["domain", "type", "content"]
            }),
        ),
        tool(
            "delete_dns_record_by_type",
            "Delete the records matching a type and optional subdomain.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "type": {"type": "string"},
                    "subdomain": {"type": "string"}
                },
                "required": ["domain", "type"]
            }),
        ),
    ]
}

/// Validate the type/priority pairing and build the shared record payload.
fn record_payload(
    record_type: RecordType,
    name: Option<&str>,
    content: &str,
    prio: Option<u32>,
    ttl: Option<u32>,
) -> crate::Result<Map<String, Value>> {
    if record_type.requires_priority() && prio.is_none() {
        return Err(BurrowError::Validation {
            field: "prio".to_string(),
            reason: format!(
                "record type {} requires a numeric priority",
                record_type.as_str()
            ),
        });
    }

    let content = checked_text("content", content)?;

    let mut payload = Map::new();
    if let Some(name) = name {
        let name = sanitize_string(name, 255);
        if !name.is_empty() {
            payload.insert("name".to_string(), json!(name));
        }
    }
    payload.insert("type".to_string(), json!(record_type.as_str()));
    payload.insert("content".to_string(), json!(content));
    if let Some(prio) = prio {
        payload.insert("prio".to_string(), json!(prio));
    }
    if let Some(ttl) = ttl {
        payload.insert("ttl".to_string(), json!(ttl));
    }
    Ok(payload)
}

/// Endpoint path for the by-name-and-type variants; the subdomain segment is
/// appended only when present.
fn by_type_path(op: &str, domain: &str, record_type: RecordType, subdomain: &str) -> String {
    if subdomain.is_empty() {
        format!("dns/{op}/{domain}/{}", record_type.as_str())
    } else {
        format!("dns/{op}/{domain}/{}/{subdomain}", record_type.as_str())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateDnsRecordArgs {
    domain: String,
    #[serde(rename = "type")]
    record_type: String,
    name: Option<String>,
    content: String,
    prio: Option<u32>,
    ttl: Option<u32>,
}

pub(crate) async fn create_dns_record(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: CreateDnsRecordArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    let record_type = checked_record_type(&args.record_type)?;
    let payload = record_payload(
        record_type,
        args.name.as_deref(),
        &args.content,
        args.prio,
        args.ttl,
    )?;

    let result = gw
        .call(
            &format!("dns/create/{}", args.domain),
            "dns/create",
            payload,
            None,
        )
        .await?;
    gw.invalidate_domain(&args.domain).await;
    Ok(result)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EditDnsRecordArgs {
    domain: String,
    record_id: String,
    #[serde(rename = "type")]
    record_type: String,
    name: Option<String>,
    content: String,
    prio: Option<u32>,
    ttl: Option<u32>,
}

pub(crate) async fn edit_dns_record(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: EditDnsRecordArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    checked_record_id(&args.record_id)?;
    let record_type = checked_record_type(&args.record_type)?;
    let payload = record_payload(
        record_type,
        args.name.as_deref(),
        &args.content,
        args.prio,
        args.ttl,
    )?;

    let result = gw
        .call(
            &format!("dns/edit/{}/{}", args.domain, args.record_id),
            "dns/edit",
            payload,
            None,
        )
        .await?;
    gw.invalidate_domain(&args.domain).await;
    Ok(result)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteDnsRecordArgs {
    domain: String,
    record_id: String,
}

pub(crate) async fn delete_dns_record(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: DeleteDnsRecordArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    checked_record_id(&args.record_id)?;
    let result = gw
        .call(
            &format!("dns/delete/{}/{}", args.domain, args.record_id),
            "dns/delete",
            Map::new(),
            None,
        )
        .await?;
    gw.invalidate_domain(&args.domain).await;
    Ok(result)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetDnsRecordsArgs {
    domain: String,
    record_id: Option<String>,
}

pub(crate) async fn get_dns_records(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: GetDnsRecordsArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    let endpoint = match &args.record_id {
        Some(record_id) => {
            checked_record_id(record_id)?;
            format!("dns/retrieve/{}/{}", args.domain, record_id)
        }
        None => format!("dns/retrieve/{}", args.domain),
    };
    gw.call(
        &endpoint,
        "dns/retrieve",
        Map::new(),
        Some(CacheCategory::DnsListing),
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ByTypeArgs {
    domain: String,
    #[serde(rename = "type")]
    record_type: String,
    subdomain: Option<String>,
}

pub(crate) async fn get_dns_records_by_type(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: ByTypeArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    let record_type = checked_record_type(&args.record_type)?;
    let subdomain = sanitize_string(args.subdomain.as_deref().unwrap_or(""), 255);
    gw.call(
        &by_type_path("retrieveByNameType", &args.domain, record_type, &subdomain),
        "dns/retrieveByNameType",
        Map::new(),
        Some(CacheCategory::DnsListing),
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EditByTypeArgs {
    domain: String,
    #[serde(rename = "type")]
    record_type: String,
    subdomain: Option<String>,
    content: String,
    prio: Option<u32>,
    ttl: Option<u32>,
}

pub(crate) async fn edit_dns_record_by_type(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: EditByTypeArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    let record_type = checked_record_type(&args.record_type)?;
    let subdomain = sanitize_string(args.subdomain.as_deref().unwrap_or(""), 255);
    // The by-type path carries the name; only content/prio/ttl ride in the body
    let payload = record_payload(record_type, None, &args.content, args.prio, args.ttl)?;

    let result = gw
        .call(
            &by_type_path("editByNameType", &args.domain, record_type, &subdomain),
            "dns/editByNameType",
            payload,
            None,
        )
        .await?;
    gw.invalidate_domain(&args.domain).await;
    Ok(result)
}

pub(crate) async fn delete_dns_record_by_type(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: ByTypeArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    let record_type = checked_record_type(&args.record_type)?;
    let subdomain = sanitize_string(args.subdomain.as_deref().unwrap_or(""), 255);
    let result = gw
        .call(
            &by_type_path("deleteByNameType", &args.domain, record_type, &subdomain),
            "dns/deleteByNameType",
            Map::new(),
            None,
        )
        .await?;
    gw.invalidate_domain(&args.domain).await;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_payload_requires_priority_for_mx() {
        let result = record_payload(RecordType::Mx, None, "mail.example.com", None, None);
        assert!(
            matches!(result, Err(BurrowError::Validation { field, .. }) if field == "prio")
        );
    }

    #[test]
    fn test_record_payload_sends_wire_type() {
        let payload =
            record_payload(RecordType::Aaaa, Some("www"), "2001:db8::1", None, Some(600)).unwrap();
        assert_eq!(payload.get("type"), Some(&json!("AAAA")));
        assert_eq!(payload.get("name"), Some(&json!("www")));
        assert_eq!(payload.get("ttl"), Some(&json!(600)));
        assert!(!payload.contains_key("prio"));
    }

    #[test]
    fn test_record_payload_strips_control_chars_from_content() {
        let payload =
            record_payload(RecordType::Txt, None, "v=spf1\x00 -all", None, None).unwrap();
        assert_eq!(payload.get("content"), Some(&json!("v=spf1 -all")));
    }

    #[test]
    fn test_record_payload_apex_omits_name() {
        let payload = record_payload(RecordType::A, Some(""), "192.0.2.1", None, None).unwrap();
        assert!(!payload.contains_key("name"));
    }

    #[test]
    fn test_by_type_path_optional_subdomain() {
        assert_eq!(
            by_type_path("retrieveByNameType", "example.com", RecordType::A, ""),
            "dns/retrieveByNameType/example.com/A"
        );
        assert_eq!(
            by_type_path("deleteByNameType", "example.com", RecordType::Txt, "www"),
            "dns/deleteByNameType/example.com/TXT/www"
        );
    }
}
