//! SSL certificate bundle retrieval.

use rmcp::model::Tool;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::cache::CacheCategory;
use crate::gateway::ApiGateway;
use crate::tools::{checked_domain, parse_args, tool};

pub(crate) fn tools() -> Vec<Tool> {
    vec![tool(
        "get_ssl_bundle",
        "Retrieve the SSL certificate bundle (certificate chain, private key, public key) for a domain. Cached.",
        json!({
            "type": "object",
            "properties": {
                "domain": {"type": "string"}
            },
            "required": ["domain"]
        }),
    )]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DomainArgs {
    domain: String,
}

pub(crate) async fn get_ssl_bundle(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: DomainArgs = parse_args(arguments)?;
    checked_domain(&args.domain)?;
    gw.call(
        &format!("ssl/retrieve/{}", args.domain),
        "ssl/retrieve",
        Map::new(),
        Some(CacheCategory::Default),
    )
    .await
}
